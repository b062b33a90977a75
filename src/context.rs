//! Per-run test context: capability flags, message log and result sink.

use crate::gl::{
    ErrorCode, EXT_FRAGMENT_SHADING_RATE, EXT_FRAGMENT_SHADING_RATE_ATTACHMENT,
    EXT_FRAGMENT_SHADING_RATE_PRIMITIVE,
};
use std::fmt;

/// Which members of the fragment shading rate extension family are exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensionSupport {
    /// `GL_EXT_fragment_shading_rate`
    pub fragment_shading_rate: bool,
    /// `GL_EXT_fragment_shading_rate_attachment`
    pub attachment: bool,
    /// `GL_EXT_fragment_shading_rate_primitive`
    pub primitive: bool,
}

impl ExtensionSupport {
    /// Everything exposed.
    pub fn all() -> Self {
        Self {
            fragment_shading_rate: true,
            attachment: true,
            primitive: true,
        }
    }

    /// Nothing exposed.
    pub fn none() -> Self {
        Self {
            fragment_shading_rate: false,
            attachment: false,
            primitive: false,
        }
    }

    /// Detects support from a list of extension names.
    ///
    /// Names are matched exactly, so `GL_EXT_fragment_shading_rate` is not
    /// reported just because `GL_EXT_fragment_shading_rate_primitive` is.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        let has = |wanted: &str| names.iter().any(|n| n.as_ref() == wanted);
        Self {
            fragment_shading_rate: has(EXT_FRAGMENT_SHADING_RATE),
            attachment: has(EXT_FRAGMENT_SHADING_RATE_ATTACHMENT),
            primitive: has(EXT_FRAGMENT_SHADING_RATE_PRIMITIVE),
        }
    }

    /// Detects support from a space-separated `GL_EXTENSIONS` string.
    pub fn from_extension_string(extensions: &str) -> Self {
        let names: Vec<&str> = extensions.split_whitespace().collect();
        Self::from_names(&names)
    }

    /// Extension names for the members that are exposed.
    pub fn names(&self) -> Vec<String> {
        let mut names = Vec::new();
        if self.fragment_shading_rate {
            names.push(EXT_FRAGMENT_SHADING_RATE.to_string());
        }
        if self.attachment {
            names.push(EXT_FRAGMENT_SHADING_RATE_ATTACHMENT.to_string());
        }
        if self.primitive {
            names.push(EXT_FRAGMENT_SHADING_RATE_PRIMITIVE.to_string());
        }
        names
    }
}

impl Default for ExtensionSupport {
    fn default() -> Self {
        Self::all()
    }
}

/// Final status of a conformance case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestStatus {
    Pass,
    Fail,
    NotSupported,
    InternalError,
}

impl TestStatus {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pass => "Pass",
            Self::Fail => "Fail",
            Self::NotSupported => "NotSupported",
            Self::InternalError => "InternalError",
        }
    }

    /// Process exit code used by the CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Pass => 0,
            Self::Fail => 1,
            Self::InternalError => 2,
            Self::NotSupported => 3,
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One intentionally invalid call and the error it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRecord {
    pub description: String,
    pub expected: ErrorCode,
    pub actual: ErrorCode,
}

impl CheckRecord {
    pub fn passed(&self) -> bool {
        self.expected == self.actual
    }
}

impl fmt::Display for CheckRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: expected {}, got {}",
            if self.passed() { "ok" } else { "FAIL" },
            self.description,
            self.expected,
            self.actual
        )
    }
}

/// State shared between the runner and a case for one run.
#[derive(Debug)]
pub struct TestContext {
    extensions: ExtensionSupport,
    messages: Vec<String>,
    checks: Vec<CheckRecord>,
    result: Option<(TestStatus, String)>,
}

impl TestContext {
    pub fn new(extensions: ExtensionSupport) -> Self {
        Self {
            extensions,
            messages: Vec::new(),
            checks: Vec::new(),
            result: None,
        }
    }

    pub fn extensions(&self) -> ExtensionSupport {
        self.extensions
    }

    /// Appends a message to the test log.
    pub fn log_message(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::info!("{}", message);
        self.messages.push(message);
    }

    /// Records a check outcome; mismatches are also written to the test log.
    pub fn record_check(&mut self, record: CheckRecord) {
        if !record.passed() {
            let message = format!(
                "{}: expected {}, got {}",
                record.description, record.expected, record.actual
            );
            log::warn!("{}", message);
            self.messages.push(message);
        } else {
            log::debug!("{}", record);
        }
        self.checks.push(record);
    }

    pub fn set_result(&mut self, status: TestStatus, description: impl Into<String>) {
        self.result = Some((status, description.into()));
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn checks(&self) -> &[CheckRecord] {
        &self.checks
    }

    pub fn failed_checks(&self) -> impl Iterator<Item = &CheckRecord> {
        self.checks.iter().filter(|p| !p.passed())
    }

    pub fn result(&self) -> Option<(TestStatus, &str)> {
        self.result.as_ref().map(|(s, d)| (*s, d.as_str()))
    }

    pub fn status(&self) -> Option<TestStatus> {
        self.result.as_ref().map(|(s, _)| *s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_support_from_string() {
        let ext = ExtensionSupport::from_extension_string(
            "GL_OES_texture_3D GL_EXT_fragment_shading_rate GL_EXT_fragment_shading_rate_attachment",
        );
        assert!(ext.fragment_shading_rate);
        assert!(ext.attachment);
        assert!(!ext.primitive);
    }

    #[test]
    fn test_extension_support_exact_match() {
        let ext = ExtensionSupport::from_names(&["GL_EXT_fragment_shading_rate_primitive"]);
        assert!(!ext.fragment_shading_rate);
        assert!(!ext.attachment);
        assert!(ext.primitive);
    }

    #[test]
    fn test_extension_support_names_round_trip() {
        let ext = ExtensionSupport {
            fragment_shading_rate: true,
            attachment: false,
            primitive: true,
        };
        assert_eq!(ExtensionSupport::from_names(&ext.names()), ext);
        assert!(ExtensionSupport::none().names().is_empty());
        assert_eq!(ExtensionSupport::default(), ExtensionSupport::all());
    }

    #[test]
    fn test_status_exit_codes() {
        assert_eq!(TestStatus::Pass.exit_code(), 0);
        assert_eq!(TestStatus::Fail.exit_code(), 1);
        assert_eq!(TestStatus::InternalError.exit_code(), 2);
        assert_eq!(TestStatus::NotSupported.exit_code(), 3);
        assert_eq!(TestStatus::NotSupported.to_string(), "NotSupported");
    }

    #[test]
    fn test_record_check_logs_only_mismatches() {
        let mut ctx = TestContext::new(ExtensionSupport::all());
        ctx.record_check(CheckRecord {
            description: "good".to_string(),
            expected: ErrorCode::InvalidEnum,
            actual: ErrorCode::InvalidEnum,
        });
        ctx.record_check(CheckRecord {
            description: "bad".to_string(),
            expected: ErrorCode::InvalidValue,
            actual: ErrorCode::NoError,
        });

        assert_eq!(ctx.checks().len(), 2);
        assert_eq!(ctx.messages().len(), 1);
        assert_eq!(
            ctx.messages()[0],
            "bad: expected GL_INVALID_VALUE, got GL_NO_ERROR"
        );
        assert_eq!(ctx.failed_checks().count(), 1);
    }

    #[test]
    fn test_result_last_write_wins() {
        let mut ctx = TestContext::new(ExtensionSupport::none());
        assert!(ctx.result().is_none());
        ctx.set_result(TestStatus::Fail, "Fail");
        ctx.set_result(TestStatus::Pass, "Pass");
        assert_eq!(ctx.result(), Some((TestStatus::Pass, "Pass")));
        assert_eq!(ctx.status(), Some(TestStatus::Pass));
    }

    #[test]
    fn test_check_record_display() {
        let record = CheckRecord {
            description: "glShadingRateEXT <rate> is not valid".to_string(),
            expected: ErrorCode::InvalidEnum,
            actual: ErrorCode::InvalidOperation,
        };
        let text = record.to_string();
        assert!(text.starts_with("[FAIL]"));
        assert!(text.contains("GL_INVALID_OPERATION"));
    }
}
