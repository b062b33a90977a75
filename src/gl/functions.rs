//! The GL entry points the shading-rate tests call.
//!
//! `GlFunctions` is the function table a test case drives. Entry points
//! mirror their GL counterparts: they never fail in Rust terms, and errors
//! are reported through `get_error` exactly as a driver would.

use super::enums::{GLboolean, GLenum, GLint, GLsizei, GLuint};

/// Driver function table used by conformance cases.
pub trait GlFunctions {
    /// `glGetError`: returns and clears the oldest pending error.
    fn get_error(&mut self) -> GLenum;

    /// The extension names exposed by the context.
    fn get_extensions(&self) -> Vec<String>;

    /// `glShadingRateEXT`
    fn shading_rate(&mut self, rate: GLenum);

    /// `glShadingRateCombinerOpsEXT`
    fn shading_rate_combiner_ops(&mut self, combiner_op0: GLenum, combiner_op1: GLenum);

    /// `glFramebufferShadingRateEXT`
    #[allow(clippy::too_many_arguments)]
    fn framebuffer_shading_rate(
        &mut self,
        target: GLenum,
        attachment: GLenum,
        texture: GLuint,
        base_layer: GLint,
        num_layers: GLsizei,
        texel_width: GLsizei,
        texel_height: GLsizei,
    );

    fn gen_framebuffers(&mut self, n: GLsizei) -> Vec<GLuint>;
    fn bind_framebuffer(&mut self, target: GLenum, framebuffer: GLuint);
    fn delete_framebuffers(&mut self, framebuffers: &[GLuint]);

    fn gen_textures(&mut self, n: GLsizei) -> Vec<GLuint>;
    fn bind_texture(&mut self, target: GLenum, texture: GLuint);
    fn delete_textures(&mut self, textures: &[GLuint]);

    /// `glTexStorage2D`: allocates immutable storage.
    fn tex_storage_2d(
        &mut self,
        target: GLenum,
        levels: GLsizei,
        internal_format: GLenum,
        width: GLsizei,
        height: GLsizei,
    );

    /// `glTexImage2D` without client data: allocates mutable storage.
    #[allow(clippy::too_many_arguments)]
    fn tex_image_2d(
        &mut self,
        target: GLenum,
        level: GLint,
        internal_format: GLint,
        width: GLsizei,
        height: GLsizei,
        border: GLint,
        format: GLenum,
        ty: GLenum,
    );

    /// `glGetIntegerv` for a single-valued `pname`.
    ///
    /// Returns `None` (and raises the GL error) when `pname` is rejected.
    fn get_integerv(&mut self, pname: GLenum) -> Option<GLint>;

    /// `glGetBooleanv` for a single-valued `pname`.
    fn get_booleanv(&mut self, pname: GLenum) -> Option<GLboolean>;
}
