//! GL scalar types and enum values used by the shading-rate tests.
//!
//! Values are taken from the GLES 3.2 core headers and the
//! `GL_EXT_fragment_shading_rate` family of extensions.

use std::fmt;

pub type GLenum = u32;
pub type GLint = i32;
pub type GLuint = u32;
pub type GLsizei = i32;
pub type GLboolean = bool;

// Errors
pub const GL_NO_ERROR: GLenum = 0;
pub const GL_INVALID_ENUM: GLenum = 0x0500;
pub const GL_INVALID_VALUE: GLenum = 0x0501;
pub const GL_INVALID_OPERATION: GLenum = 0x0502;
pub const GL_OUT_OF_MEMORY: GLenum = 0x0505;
pub const GL_INVALID_FRAMEBUFFER_OPERATION: GLenum = 0x0506;

// Core objects and formats
pub const GL_TEXTURE_2D: GLenum = 0x0DE1;
pub const GL_UNSIGNED_BYTE: GLenum = 0x1401;
pub const GL_RED: GLenum = 0x1903;
pub const GL_R8: GLenum = 0x8229;
pub const GL_R8UI: GLenum = 0x8232;
pub const GL_SAMPLE_SHADING: GLenum = 0x8C36;
pub const GL_READ_FRAMEBUFFER: GLenum = 0x8CA8;
pub const GL_DRAW_FRAMEBUFFER: GLenum = 0x8CA9;
pub const GL_COLOR_ATTACHMENT0: GLenum = 0x8CE0;
pub const GL_FRAMEBUFFER: GLenum = 0x8D40;
pub const GL_RENDERBUFFER: GLenum = 0x8D41;

// GL_EXT_fragment_shading_rate
pub const GL_SHADING_RATE_1X1_PIXELS_EXT: GLenum = 0x96A6;
pub const GL_SHADING_RATE_1X2_PIXELS_EXT: GLenum = 0x96A7;
pub const GL_SHADING_RATE_2X1_PIXELS_EXT: GLenum = 0x96A8;
pub const GL_SHADING_RATE_2X2_PIXELS_EXT: GLenum = 0x96A9;
pub const GL_SHADING_RATE_1X4_PIXELS_EXT: GLenum = 0x96AA;
pub const GL_SHADING_RATE_4X1_PIXELS_EXT: GLenum = 0x96AB;
pub const GL_SHADING_RATE_4X2_PIXELS_EXT: GLenum = 0x96AC;
pub const GL_SHADING_RATE_2X4_PIXELS_EXT: GLenum = 0x96AD;
pub const GL_SHADING_RATE_4X4_PIXELS_EXT: GLenum = 0x96AE;
pub const GL_SHADING_RATE_EXT: GLenum = 0x96D0;
pub const GL_SHADING_RATE_ATTACHMENT_EXT: GLenum = 0x96D1;
pub const GL_FRAGMENT_SHADING_RATE_COMBINER_OP_KEEP_EXT: GLenum = 0x96D2;
pub const GL_FRAGMENT_SHADING_RATE_COMBINER_OP_REPLACE_EXT: GLenum = 0x96D3;
pub const GL_FRAGMENT_SHADING_RATE_COMBINER_OP_MIN_EXT: GLenum = 0x96D4;
pub const GL_FRAGMENT_SHADING_RATE_COMBINER_OP_MAX_EXT: GLenum = 0x96D5;
pub const GL_FRAGMENT_SHADING_RATE_COMBINER_OP_MUL_EXT: GLenum = 0x96D6;
pub const GL_MIN_FRAGMENT_SHADING_RATE_ATTACHMENT_TEXEL_WIDTH_EXT: GLenum = 0x96D7;
pub const GL_MAX_FRAGMENT_SHADING_RATE_ATTACHMENT_TEXEL_WIDTH_EXT: GLenum = 0x96D8;
pub const GL_MIN_FRAGMENT_SHADING_RATE_ATTACHMENT_TEXEL_HEIGHT_EXT: GLenum = 0x96D9;
pub const GL_MAX_FRAGMENT_SHADING_RATE_ATTACHMENT_TEXEL_HEIGHT_EXT: GLenum = 0x96DA;
pub const GL_MAX_FRAGMENT_SHADING_RATE_ATTACHMENT_TEXEL_ASPECT_RATIO_EXT: GLenum = 0x96DB;
pub const GL_MAX_FRAGMENT_SHADING_RATE_ATTACHMENT_LAYERS_EXT: GLenum = 0x96DC;
pub const GL_FRAGMENT_SHADING_RATE_NON_TRIVIAL_COMBINERS_SUPPORTED_EXT: GLenum = 0x8F6F;

/// Extension names as they appear in the `GL_EXTENSIONS` list.
pub const EXT_FRAGMENT_SHADING_RATE: &str = "GL_EXT_fragment_shading_rate";
pub const EXT_FRAGMENT_SHADING_RATE_ATTACHMENT: &str = "GL_EXT_fragment_shading_rate_attachment";
pub const EXT_FRAGMENT_SHADING_RATE_PRIMITIVE: &str = "GL_EXT_fragment_shading_rate_primitive";

/// The nine shading rates accepted by `glShadingRateEXT`.
pub const SHADING_RATES: [GLenum; 9] = [
    GL_SHADING_RATE_1X1_PIXELS_EXT,
    GL_SHADING_RATE_1X2_PIXELS_EXT,
    GL_SHADING_RATE_2X1_PIXELS_EXT,
    GL_SHADING_RATE_2X2_PIXELS_EXT,
    GL_SHADING_RATE_1X4_PIXELS_EXT,
    GL_SHADING_RATE_4X1_PIXELS_EXT,
    GL_SHADING_RATE_4X2_PIXELS_EXT,
    GL_SHADING_RATE_2X4_PIXELS_EXT,
    GL_SHADING_RATE_4X4_PIXELS_EXT,
];

/// Combiner operators accepted by `glShadingRateCombinerOpsEXT`.
pub const COMBINER_OPS: [GLenum; 5] = [
    GL_FRAGMENT_SHADING_RATE_COMBINER_OP_KEEP_EXT,
    GL_FRAGMENT_SHADING_RATE_COMBINER_OP_REPLACE_EXT,
    GL_FRAGMENT_SHADING_RATE_COMBINER_OP_MIN_EXT,
    GL_FRAGMENT_SHADING_RATE_COMBINER_OP_MAX_EXT,
    GL_FRAGMENT_SHADING_RATE_COMBINER_OP_MUL_EXT,
];

/// Returns true for KEEP and REPLACE, the operators every implementation supports.
pub fn is_trivial_combiner(op: GLenum) -> bool {
    op == GL_FRAGMENT_SHADING_RATE_COMBINER_OP_KEEP_EXT
        || op == GL_FRAGMENT_SHADING_RATE_COMBINER_OP_REPLACE_EXT
}

/// Typed view of a `glGetError` result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NoError,
    InvalidEnum,
    InvalidValue,
    InvalidOperation,
    InvalidFramebufferOperation,
    OutOfMemory,
    Unknown(GLenum),
}

impl ErrorCode {
    /// Maps a raw GL error value onto the typed code.
    pub fn from_raw(raw: GLenum) -> Self {
        match raw {
            GL_NO_ERROR => Self::NoError,
            GL_INVALID_ENUM => Self::InvalidEnum,
            GL_INVALID_VALUE => Self::InvalidValue,
            GL_INVALID_OPERATION => Self::InvalidOperation,
            GL_INVALID_FRAMEBUFFER_OPERATION => Self::InvalidFramebufferOperation,
            GL_OUT_OF_MEMORY => Self::OutOfMemory,
            other => Self::Unknown(other),
        }
    }

    /// Returns the raw GL value.
    #[cfg(test)]
    pub fn raw(&self) -> GLenum {
        match self {
            Self::NoError => GL_NO_ERROR,
            Self::InvalidEnum => GL_INVALID_ENUM,
            Self::InvalidValue => GL_INVALID_VALUE,
            Self::InvalidOperation => GL_INVALID_OPERATION,
            Self::InvalidFramebufferOperation => GL_INVALID_FRAMEBUFFER_OPERATION,
            Self::OutOfMemory => GL_OUT_OF_MEMORY,
            Self::Unknown(raw) => *raw,
        }
    }

    /// Returns the GL symbol name of this code.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NoError => "GL_NO_ERROR",
            Self::InvalidEnum => "GL_INVALID_ENUM",
            Self::InvalidValue => "GL_INVALID_VALUE",
            Self::InvalidOperation => "GL_INVALID_OPERATION",
            Self::InvalidFramebufferOperation => "GL_INVALID_FRAMEBUFFER_OPERATION",
            Self::OutOfMemory => "GL_OUT_OF_MEMORY",
            Self::Unknown(_) => "unknown error",
        }
    }

    pub fn is_error(&self) -> bool {
        !matches!(self, Self::NoError)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(raw) => write!(f, "unknown error (0x{:04X})", raw),
            other => f.write_str(other.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_from_raw() {
        assert_eq!(ErrorCode::from_raw(0), ErrorCode::NoError);
        assert_eq!(ErrorCode::from_raw(0x0500), ErrorCode::InvalidEnum);
        assert_eq!(ErrorCode::from_raw(0x0501), ErrorCode::InvalidValue);
        assert_eq!(ErrorCode::from_raw(0x0502), ErrorCode::InvalidOperation);
        assert_eq!(ErrorCode::from_raw(0x0505), ErrorCode::OutOfMemory);
        assert_eq!(ErrorCode::from_raw(0x1234), ErrorCode::Unknown(0x1234));
    }

    #[test]
    fn test_error_code_raw_matches_constants() {
        assert_eq!(ErrorCode::InvalidEnum.raw(), GL_INVALID_ENUM);
        assert_eq!(ErrorCode::Unknown(0xBEEF).raw(), 0xBEEF);
        assert_eq!(
            ErrorCode::from_raw(GL_INVALID_FRAMEBUFFER_OPERATION).raw(),
            GL_INVALID_FRAMEBUFFER_OPERATION
        );
    }

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::InvalidValue.to_string(), "GL_INVALID_VALUE");
        assert_eq!(ErrorCode::NoError.to_string(), "GL_NO_ERROR");
        assert!(ErrorCode::Unknown(0xABCD).to_string().contains("0xABCD"));
    }

    #[test]
    fn test_is_error() {
        assert!(!ErrorCode::NoError.is_error());
        assert!(ErrorCode::OutOfMemory.is_error());
    }

    #[test]
    fn test_sample_shading_is_not_a_shading_rate() {
        assert!(!SHADING_RATES.contains(&GL_SAMPLE_SHADING));
        assert_eq!(SHADING_RATES.len(), 9);
    }

    #[test]
    fn test_trivial_combiners() {
        assert!(is_trivial_combiner(GL_FRAGMENT_SHADING_RATE_COMBINER_OP_KEEP_EXT));
        assert!(is_trivial_combiner(GL_FRAGMENT_SHADING_RATE_COMBINER_OP_REPLACE_EXT));
        assert!(!is_trivial_combiner(GL_FRAGMENT_SHADING_RATE_COMBINER_OP_MIN_EXT));
        assert!(!is_trivial_combiner(GL_FRAGMENT_SHADING_RATE_COMBINER_OP_MAX_EXT));
        assert!(!is_trivial_combiner(GL_FRAGMENT_SHADING_RATE_COMBINER_OP_MUL_EXT));
    }
}
