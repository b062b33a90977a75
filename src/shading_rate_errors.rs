//! Negative API tests for `GL_EXT_fragment_shading_rate`.
//!
//! Every entry point of the extension family is called with arguments the
//! extension forbids, and the error reported by `glGetError` is compared
//! against the one the extension mandates. A wrong code is recorded as a
//! failed check and the run continues; a GL error during setup aborts the
//! case with `CaseError::Setup`.

use crate::context::{CheckRecord, TestContext, TestStatus};
use crate::error::CaseError;
use crate::gl::*;
use crate::traits::{ConformanceCase, IterateResult};

const BASE_LAYER: GLint = 0;
const NUM_LAYERS: GLsizei = 1;
const TEXTURE_WIDTH: GLsizei = 256;
const TEXTURE_HEIGHT: GLsizei = 256;
const TEXEL_WIDTH: GLsizei = 16;
const TEXEL_HEIGHT: GLsizei = 16;

/// Stale errors drained before the first check, at most.
const MAX_STALE_ERRORS: usize = 16;

const KEEP: GLenum = GL_FRAGMENT_SHADING_RATE_COMBINER_OP_KEEP_EXT;
const REPLACE: GLenum = GL_FRAGMENT_SHADING_RATE_COMBINER_OP_REPLACE_EXT;

/// Objects created for the attachment checks.
#[derive(Debug, Default)]
struct AttachmentObjects {
    framebuffer: Option<GLuint>,
    textures: Vec<GLuint>,
}

impl AttachmentObjects {
    fn release(self, gl: &mut dyn GlFunctions) {
        if let Some(framebuffer) = self.framebuffer {
            gl.delete_framebuffers(&[framebuffer]);
        }
        if !self.textures.is_empty() {
            gl.delete_textures(&self.textures);
        }
    }
}

/// The fragment shading rate negative API test.
#[derive(Debug, Default)]
pub struct FragmentShadingRateErrors;

impl FragmentShadingRateErrors {
    pub fn new() -> Self {
        Self
    }

    /// Reads the next error and records whether it is `expected`.
    fn verify_error(
        ctx: &mut TestContext,
        gl: &mut dyn GlFunctions,
        expected: GLenum,
        description: &str,
    ) -> bool {
        let record = CheckRecord {
            description: description.to_string(),
            expected: ErrorCode::from_raw(expected),
            actual: ErrorCode::from_raw(gl.get_error()),
        };
        let passed = record.passed();
        ctx.record_check(record);
        passed
    }

    /// Fails the case if a setup call raised an error.
    fn expect_no_error(gl: &mut dyn GlFunctions, step: &str) -> Result<(), CaseError> {
        match ErrorCode::from_raw(gl.get_error()) {
            ErrorCode::NoError => Ok(()),
            code => Err(CaseError::setup(step, code)),
        }
    }

    fn drain_stale_errors(gl: &mut dyn GlFunctions) {
        for _ in 0..MAX_STALE_ERRORS {
            let code = ErrorCode::from_raw(gl.get_error());
            if !code.is_error() {
                return;
            }
            log::debug!("Discarding stale {} before probing", code);
        }
    }

    fn query_integer(
        gl: &mut dyn GlFunctions,
        pname: GLenum,
        name: &str,
    ) -> Result<GLint, CaseError> {
        let value = gl.get_integerv(pname);
        Self::expect_no_error(gl, &format!("Error getIntegerv {}!", name))?;
        Ok(value.unwrap_or(0))
    }

    fn query_limits(gl: &mut dyn GlFunctions) -> Result<AttachmentLimits, CaseError> {
        let limits = AttachmentLimits {
            min_texel_width: Self::query_integer(
                gl,
                GL_MIN_FRAGMENT_SHADING_RATE_ATTACHMENT_TEXEL_WIDTH_EXT,
                "GL_MIN_FRAGMENT_SHADING_RATE_ATTACHMENT_TEXEL_WIDTH_EXT",
            )?,
            max_texel_width: Self::query_integer(
                gl,
                GL_MAX_FRAGMENT_SHADING_RATE_ATTACHMENT_TEXEL_WIDTH_EXT,
                "GL_MAX_FRAGMENT_SHADING_RATE_ATTACHMENT_TEXEL_WIDTH_EXT",
            )?,
            min_texel_height: Self::query_integer(
                gl,
                GL_MIN_FRAGMENT_SHADING_RATE_ATTACHMENT_TEXEL_HEIGHT_EXT,
                "GL_MIN_FRAGMENT_SHADING_RATE_ATTACHMENT_TEXEL_HEIGHT_EXT",
            )?,
            max_texel_height: Self::query_integer(
                gl,
                GL_MAX_FRAGMENT_SHADING_RATE_ATTACHMENT_TEXEL_HEIGHT_EXT,
                "GL_MAX_FRAGMENT_SHADING_RATE_ATTACHMENT_TEXEL_HEIGHT_EXT",
            )?,
            max_aspect_ratio: Self::query_integer(
                gl,
                GL_MAX_FRAGMENT_SHADING_RATE_ATTACHMENT_TEXEL_ASPECT_RATIO_EXT,
                "GL_MAX_FRAGMENT_SHADING_RATE_ATTACHMENT_TEXEL_ASPECT_RATIO_EXT",
            )?,
            max_layers: Self::query_integer(
                gl,
                GL_MAX_FRAGMENT_SHADING_RATE_ATTACHMENT_LAYERS_EXT,
                "GL_MAX_FRAGMENT_SHADING_RATE_ATTACHMENT_LAYERS_EXT",
            )?,
        };
        log::debug!("Shading rate attachment limits: {:?}", limits);
        Ok(limits)
    }

    /// Runs the attachment checks, releasing every object created on the way
    /// whether or not setup succeeded.
    fn attachment_checks(
        ctx: &mut TestContext,
        gl: &mut dyn GlFunctions,
    ) -> Result<bool, CaseError> {
        let mut objects = AttachmentObjects::default();
        let outcome = Self::run_attachment_checks(ctx, gl, &mut objects);
        objects.release(gl);
        outcome
    }

    fn run_attachment_checks(
        ctx: &mut TestContext,
        gl: &mut dyn GlFunctions,
        objects: &mut AttachmentObjects,
    ) -> Result<bool, CaseError> {
        let framebuffers = gl.gen_framebuffers(1);
        objects.framebuffer = framebuffers.first().copied();
        Self::expect_no_error(gl, "Error setting up framebuffer objects")?;
        let fbo = objects
            .framebuffer
            .ok_or_else(|| CaseError::setup("No framebuffer name generated", ErrorCode::NoError))?;

        gl.bind_framebuffer(GL_FRAMEBUFFER, fbo);
        Self::expect_no_error(gl, "Error binding frame buffer object!")?;

        objects.textures.extend(gl.gen_textures(1));
        Self::expect_no_error(gl, "Error generating texture objects")?;
        objects.textures.extend(gl.gen_textures(1));
        Self::expect_no_error(gl, "Error generating texture objects")?;
        let (immutable, mutable) = match objects.textures.as_slice() {
            [immutable, mutable] => (*immutable, *mutable),
            _ => {
                return Err(CaseError::setup(
                    "Expected two texture names",
                    ErrorCode::NoError,
                ))
            }
        };

        gl.bind_texture(GL_TEXTURE_2D, immutable);
        Self::expect_no_error(gl, "Error binding texture object!")?;
        gl.tex_storage_2d(GL_TEXTURE_2D, 1, GL_R8UI, TEXTURE_WIDTH, TEXTURE_HEIGHT);
        Self::expect_no_error(gl, "Error allocating texture object!")?;

        gl.bind_texture(GL_TEXTURE_2D, mutable);
        Self::expect_no_error(gl, "Error binding texture object!")?;
        gl.tex_image_2d(
            GL_TEXTURE_2D,
            0,
            GL_R8 as GLint,
            TEXTURE_WIDTH,
            TEXTURE_HEIGHT,
            0,
            GL_RED,
            GL_UNSIGNED_BYTE,
        );
        Self::expect_no_error(gl, "Error allocating texture object!")?;

        let limits = Self::query_limits(gl)?;
        let mut passed = true;

        // Only DRAW_FRAMEBUFFER, READ_FRAMEBUFFER and FRAMEBUFFER are targets.
        gl.framebuffer_shading_rate(
            GL_RENDERBUFFER,
            GL_SHADING_RATE_ATTACHMENT_EXT,
            immutable,
            BASE_LAYER,
            NUM_LAYERS,
            TEXEL_WIDTH,
            TEXEL_HEIGHT,
        );
        passed &= Self::verify_error(
            ctx,
            gl,
            GL_INVALID_ENUM,
            "glFramebufferShadingRateEXT accepted an invalid <target>",
        );

        gl.framebuffer_shading_rate(
            GL_FRAMEBUFFER,
            GL_COLOR_ATTACHMENT0,
            immutable,
            BASE_LAYER,
            NUM_LAYERS,
            TEXEL_WIDTH,
            TEXEL_HEIGHT,
        );
        passed &= Self::verify_error(
            ctx,
            gl,
            GL_INVALID_ENUM,
            "glFramebufferShadingRateEXT accepted an invalid <attachment>",
        );

        gl.framebuffer_shading_rate(
            GL_FRAMEBUFFER,
            GL_SHADING_RATE_ATTACHMENT_EXT,
            mutable,
            BASE_LAYER,
            NUM_LAYERS,
            TEXEL_WIDTH,
            TEXEL_HEIGHT,
        );
        passed &= Self::verify_error(
            ctx,
            gl,
            GL_INVALID_VALUE,
            "glFramebufferShadingRateEXT accepted a mutable <texture>",
        );

        // baseLayer must be strictly below the layer limit.
        gl.framebuffer_shading_rate(
            GL_FRAMEBUFFER,
            GL_SHADING_RATE_ATTACHMENT_EXT,
            immutable,
            limits.max_layers,
            NUM_LAYERS,
            TEXEL_WIDTH,
            TEXEL_HEIGHT,
        );
        passed &= Self::verify_error(
            ctx,
            gl,
            GL_INVALID_VALUE,
            "glFramebufferShadingRateEXT accepted an out of range <baseLayer>",
        );

        match limits.max_layers.checked_add(1) {
            Some(num_layers) => {
                gl.framebuffer_shading_rate(
                    GL_FRAMEBUFFER,
                    GL_SHADING_RATE_ATTACHMENT_EXT,
                    immutable,
                    BASE_LAYER,
                    num_layers,
                    TEXEL_WIDTH,
                    TEXEL_HEIGHT,
                );
                passed &= Self::verify_error(
                    ctx,
                    gl,
                    GL_INVALID_VALUE,
                    "glFramebufferShadingRateEXT accepted an out of range <numLayers>",
                );
            }
            None => ctx.log_message(format!(
                "GL_MAX_FRAGMENT_SHADING_RATE_ATTACHMENT_LAYERS_EXT is {}, a larger <numLayers> cannot be represented; <numLayers> check skipped",
                limits.max_layers
            )),
        }

        // Twice the allowed aspect ratio, in each direction.
        let tall = limits
            .min_texel_width
            .saturating_mul(limits.max_aspect_ratio)
            .saturating_mul(2);
        if tall > limits.max_texel_height {
            ctx.log_message(format!(
                "<texelHeight> {} is above GL_MAX_FRAGMENT_SHADING_RATE_ATTACHMENT_TEXEL_HEIGHT_EXT ({}); aspect ratio check also hits the texel range",
                tall, limits.max_texel_height
            ));
        }
        gl.framebuffer_shading_rate(
            GL_FRAMEBUFFER,
            GL_SHADING_RATE_ATTACHMENT_EXT,
            immutable,
            BASE_LAYER,
            NUM_LAYERS,
            limits.min_texel_width,
            tall,
        );
        passed &= Self::verify_error(
            ctx,
            gl,
            GL_INVALID_VALUE,
            "glFramebufferShadingRateEXT accepted <texelHeight> / <texelWidth> above the aspect ratio limit",
        );

        let wide = limits
            .min_texel_height
            .saturating_mul(limits.max_aspect_ratio)
            .saturating_mul(2);
        if wide > limits.max_texel_width {
            ctx.log_message(format!(
                "<texelWidth> {} is above GL_MAX_FRAGMENT_SHADING_RATE_ATTACHMENT_TEXEL_WIDTH_EXT ({}); aspect ratio check also hits the texel range",
                wide, limits.max_texel_width
            ));
        }
        gl.framebuffer_shading_rate(
            GL_FRAMEBUFFER,
            GL_SHADING_RATE_ATTACHMENT_EXT,
            immutable,
            BASE_LAYER,
            NUM_LAYERS,
            wide,
            limits.min_texel_height,
        );
        passed &= Self::verify_error(
            ctx,
            gl,
            GL_INVALID_VALUE,
            "glFramebufferShadingRateEXT accepted <texelWidth> / <texelHeight> above the aspect ratio limit",
        );

        Ok(passed)
    }

    fn combiner_checks(
        ctx: &mut TestContext,
        gl: &mut dyn GlFunctions,
    ) -> Result<bool, CaseError> {
        let ext = ctx.extensions();
        let mut passed = true;

        gl.shading_rate_combiner_ops(GL_SHADING_RATE_EXT, REPLACE);
        passed &= Self::verify_error(
            ctx,
            gl,
            GL_INVALID_ENUM,
            "glShadingRateCombinerOpsEXT accepted an invalid <combinerOp0>",
        );

        gl.shading_rate_combiner_ops(KEEP, GL_MIN_FRAGMENT_SHADING_RATE_ATTACHMENT_TEXEL_WIDTH_EXT);
        passed &= Self::verify_error(
            ctx,
            gl,
            GL_INVALID_ENUM,
            "glShadingRateCombinerOpsEXT accepted an invalid <combinerOp1>",
        );

        let non_trivial = gl.get_booleanv(GL_FRAGMENT_SHADING_RATE_NON_TRIVIAL_COMBINERS_SUPPORTED_EXT);
        Self::expect_no_error(gl, "Error getBooleanv non trivial combiner")?;

        if !non_trivial.unwrap_or(false) {
            gl.shading_rate_combiner_ops(GL_FRAGMENT_SHADING_RATE_COMBINER_OP_MIN_EXT, KEEP);
            passed &= Self::verify_error(
                ctx,
                gl,
                GL_INVALID_OPERATION,
                "glShadingRateCombinerOpsEXT accepted non-trivial <combinerOp0> without support",
            );

            gl.shading_rate_combiner_ops(REPLACE, GL_FRAGMENT_SHADING_RATE_COMBINER_OP_MUL_EXT);
            passed &= Self::verify_error(
                ctx,
                gl,
                GL_INVALID_OPERATION,
                "glShadingRateCombinerOpsEXT accepted non-trivial <combinerOp1> without support",
            );
        }

        // Without the primitive extension combinerOp0 must be KEEP.
        if !ext.primitive {
            gl.shading_rate_combiner_ops(REPLACE, KEEP);
            passed &= Self::verify_error(
                ctx,
                gl,
                GL_INVALID_OPERATION,
                "glShadingRateCombinerOpsEXT accepted <combinerOp0> other than KEEP without GL_EXT_fragment_shading_rate_primitive",
            );
        }

        // Without the attachment extension combinerOp1 must be KEEP.
        if !ext.attachment {
            gl.shading_rate_combiner_ops(KEEP, REPLACE);
            passed &= Self::verify_error(
                ctx,
                gl,
                GL_INVALID_OPERATION,
                "glShadingRateCombinerOpsEXT accepted <combinerOp1> other than KEEP without GL_EXT_fragment_shading_rate_attachment",
            );
        }

        Ok(passed)
    }
}

impl ConformanceCase for FragmentShadingRateErrors {
    fn name(&self) -> &'static str {
        "fragment_shading_rate_errors"
    }

    fn description(&self) -> &'static str {
        "Invalid fragment shading rate API usage generates the mandated errors"
    }

    fn init(&mut self, ctx: &mut TestContext) -> Result<(), CaseError> {
        if !ctx.extensions().fragment_shading_rate {
            return Err(CaseError::NotSupported(format!(
                "{} is not supported",
                EXT_FRAGMENT_SHADING_RATE
            )));
        }
        Ok(())
    }

    fn iterate(
        &mut self,
        ctx: &mut TestContext,
        gl: &mut dyn GlFunctions,
    ) -> Result<IterateResult, CaseError> {
        Self::drain_stale_errors(gl);
        let mut passed = true;

        gl.shading_rate(GL_SAMPLE_SHADING);
        passed &= Self::verify_error(
            ctx,
            gl,
            GL_INVALID_ENUM,
            "glShadingRateEXT accepted an invalid <rate>",
        );

        if ctx.extensions().attachment {
            passed &= Self::attachment_checks(ctx, gl)?;
        } else {
            log::info!("Attachment checks skipped: extension not supported");
        }

        passed &= Self::combiner_checks(ctx, gl)?;

        if passed {
            ctx.set_result(TestStatus::Pass, "Pass");
        } else {
            ctx.set_result(TestStatus::Fail, "Fail");
        }
        Ok(IterateResult::Stop)
    }

    fn deinit(&mut self, ctx: &mut TestContext) {
        log::debug!(
            "{} finished with {} checks ({} failed)",
            self.name(),
            ctx.checks().len(),
            ctx.failed_checks().count()
        );
    }
}
