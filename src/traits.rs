//! Core traits for conformance cases.
//!
//! This module defines the `ConformanceCase` trait that every case run by
//! `run_case` implements, plus the driver loop itself.

use crate::context::{TestContext, TestStatus};
use crate::error::CaseError;
use crate::gl::GlFunctions;

/// What the runner should do after an `iterate` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(dead_code)]
pub enum IterateResult {
    /// The case has finished and set its result.
    Stop,
    /// Call `iterate` again.
    Continue,
}

/// A single conformance test case.
///
/// Lifecycle: `init` once, `iterate` until it returns `Stop`, then `deinit`.
/// `deinit` runs whenever `init` succeeded, including after an `iterate`
/// error.
pub trait ConformanceCase {
    /// Returns the case name (e.g., "fragment_shading_rate_errors").
    fn name(&self) -> &'static str;

    /// Returns a one-line description.
    fn description(&self) -> &'static str;

    /// Checks requirements. Returns `CaseError::NotSupported` to skip.
    fn init(&mut self, ctx: &mut TestContext) -> Result<(), CaseError>;

    /// Runs the case.
    ///
    /// # Returns
    /// * `Ok(IterateResult)` - The case ran; its result is in `ctx`
    /// * `Err(CaseError)` - Infrastructure failure, the case was aborted
    fn iterate(
        &mut self,
        ctx: &mut TestContext,
        gl: &mut dyn GlFunctions,
    ) -> Result<IterateResult, CaseError>;

    /// Releases anything `init` acquired.
    fn deinit(&mut self, ctx: &mut TestContext);
}

/// Upper bound on `iterate` calls before the runner gives up on a case.
pub const MAX_ITERATIONS: usize = 1024;

/// Runs `case` to completion against `gl` and returns the final status.
///
/// `NotSupported` from `init` and errors from `iterate` are turned into a
/// result on `ctx`; they never propagate.
pub fn run_case(
    case: &mut dyn ConformanceCase,
    ctx: &mut TestContext,
    gl: &mut dyn GlFunctions,
) -> TestStatus {
    log::info!("Running {}: {}", case.name(), case.description());

    if let Err(err) = case.init(ctx) {
        let status = match err {
            CaseError::NotSupported(_) => TestStatus::NotSupported,
            _ => TestStatus::InternalError,
        };
        log::warn!("{} init: {}", case.name(), err);
        ctx.set_result(status, err.to_string());
        return status;
    }

    let mut iterations = 0;
    let outcome = loop {
        iterations += 1;
        if iterations > MAX_ITERATIONS {
            break Err(CaseError::Config(format!(
                "{} did not stop after {} iterations",
                case.name(),
                MAX_ITERATIONS
            )));
        }
        match case.iterate(ctx, gl) {
            Ok(IterateResult::Stop) => break Ok(()),
            Ok(IterateResult::Continue) => continue,
            Err(err) => break Err(err),
        }
    };

    if let Err(err) = outcome {
        log::error!("{} aborted: {}", case.name(), err);
        ctx.log_message(err.to_string());
        ctx.set_result(TestStatus::InternalError, err.to_string());
    }

    case.deinit(ctx);

    match ctx.status() {
        Some(status) => status,
        None => {
            ctx.set_result(TestStatus::InternalError, "Case finished without a result");
            TestStatus::InternalError
        }
    }
}
