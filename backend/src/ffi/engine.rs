//! PyO3 wrapper for the optimization engine
//!
//! # Example (from Python)
//!
//! ```python
//! import json
//! from route_optimizer._core import OptimizationEngine
//!
//! request = {
//!     "forecasted_demand": [...],
//!     "current_route_topology": {...},
//!     "optimization_constraints": {"min_headway": 5, "max_headway": 30},
//! }
//!
//! response = json.loads(OptimizationEngine.run_json(json.dumps(request)))
//! print(response["impact_metrics"]["total_wait_reduction_s"])
//! ```

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use crate::api::{run_optimization_with_report, OptimizationRequest};

/// Python entry point to the optimization engine
///
/// Stateless: every call runs one complete session. The JSON boundary keeps
/// the FFI surface minimal and the contract identical to the HTTP layer's.
#[pyclass(name = "OptimizationEngine")]
pub struct PyOptimizationEngine;

#[pymethods]
impl PyOptimizationEngine {
    /// Run one optimization session
    ///
    /// # Arguments
    ///
    /// * `request_json` - serialized `OptimizationRequest`
    ///
    /// # Returns
    ///
    /// Serialized `OptimizationResponse`
    ///
    /// # Errors
    ///
    /// Raises `ValueError` for malformed requests and `RuntimeError` for
    /// fatal session errors (unusable topology or demand table).
    #[staticmethod]
    fn run_json(request_json: &str) -> PyResult<String> {
        let request: OptimizationRequest = serde_json::from_str(request_json)
            .map_err(|e| PyValueError::new_err(format!("invalid request: {}", e)))?;

        let (response, _report) = run_optimization_with_report(&request)
            .map_err(|e| PyRuntimeError::new_err(format!("optimization failed: {}", e)))?;

        serde_json::to_string(&response)
            .map_err(|e| PyRuntimeError::new_err(format!("response serialization failed: {}", e)))
    }

    /// Run one optimization session and return the operator text report
    #[staticmethod]
    fn run_text_report(request_json: &str) -> PyResult<String> {
        let request: OptimizationRequest = serde_json::from_str(request_json)
            .map_err(|e| PyValueError::new_err(format!("invalid request: {}", e)))?;

        let (_response, report) = run_optimization_with_report(&request)
            .map_err(|e| PyRuntimeError::new_err(format!("optimization failed: {}", e)))?;

        Ok(report.render_text())
    }
}
