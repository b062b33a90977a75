//! Software reference driver.
//!
//! `ReferenceDriver` implements `GlFunctions` by validating arguments the way
//! `GL_EXT_fragment_shading_rate` requires, without rendering anything. It
//! keeps just enough object state (framebuffers, textures, bindings) to
//! answer the questions the extension's error rules ask, and can be told to
//! break specific rules so that the conformance case has something to catch.

use super::enums::*;
use super::functions::GlFunctions;
use crate::context::ExtensionSupport;
use crate::error::DriverError;
use clap::ValueEnum;
use std::collections::HashMap;

/// `GL_RED_INTEGER`, accepted for integer formats by `tex_image_2d`.
const GL_RED_INTEGER: GLenum = 0x8D94;

/// Shading rate attachment capabilities reported through `glGetIntegerv`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentLimits {
    pub min_texel_width: GLint,
    pub max_texel_width: GLint,
    pub min_texel_height: GLint,
    pub max_texel_height: GLint,
    pub max_aspect_ratio: GLint,
    pub max_layers: GLint,
}

impl Default for AttachmentLimits {
    fn default() -> Self {
        Self {
            min_texel_width: 8,
            max_texel_width: 32,
            min_texel_height: 8,
            max_texel_height: 32,
            max_aspect_ratio: 2,
            max_layers: 1,
        }
    }
}

impl AttachmentLimits {
    /// Checks that the limits describe a usable implementation.
    pub fn validate(&self) -> Result<(), DriverError> {
        for (axis, min, max) in [
            ("width", self.min_texel_width, self.max_texel_width),
            ("height", self.min_texel_height, self.max_texel_height),
        ] {
            if min < 1 || min > max {
                return Err(DriverError::InvalidTexelRange { axis, min, max });
            }
        }
        if self.max_aspect_ratio < 1 {
            return Err(DriverError::InvalidLimit {
                name: "max aspect ratio",
                value: self.max_aspect_ratio,
            });
        }
        if self.max_layers < 1 {
            return Err(DriverError::InvalidLimit {
                name: "max layers",
                value: self.max_layers,
            });
        }
        Ok(())
    }
}

/// Validation rules the driver can be told to get wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Fault {
    /// `glShadingRateEXT` accepts any enum.
    AcceptAnyRate,
    /// Mutable textures are accepted as shading rate attachments.
    AcceptMutableTexture,
    /// `baseLayer == MAX_..._LAYERS` is accepted.
    InclusiveLayerBound,
    /// Texel aspect ratio is not checked.
    IgnoreAspectRatio,
    /// Unknown combiner operators are not rejected.
    IgnoreCombinerEnums,
    /// Non-trivial combiners are accepted even when reported unsupported.
    AllowNonTrivialCombiners,
    /// `glTexStorage2D` runs out of memory.
    FailTextureStorage,
    /// `GL_INVALID_OPERATION` is reported in place of `GL_INVALID_ENUM`.
    WrongErrorCode,
}

impl Fault {
    /// Returns all faults.
    pub fn all_faults() -> Vec<Self> {
        vec![
            Self::AcceptAnyRate,
            Self::AcceptMutableTexture,
            Self::InclusiveLayerBound,
            Self::IgnoreAspectRatio,
            Self::IgnoreCombinerEnums,
            Self::AllowNonTrivialCombiners,
            Self::FailTextureStorage,
            Self::WrongErrorCode,
        ]
    }

    /// Returns the command-line name of this fault.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AcceptAnyRate => "accept-any-rate",
            Self::AcceptMutableTexture => "accept-mutable-texture",
            Self::InclusiveLayerBound => "inclusive-layer-bound",
            Self::IgnoreAspectRatio => "ignore-aspect-ratio",
            Self::IgnoreCombinerEnums => "ignore-combiner-enums",
            Self::AllowNonTrivialCombiners => "allow-non-trivial-combiners",
            Self::FailTextureStorage => "fail-texture-storage",
            Self::WrongErrorCode => "wrong-error-code",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::AcceptAnyRate => "glShadingRateEXT accepts any enum",
            Self::AcceptMutableTexture => "mutable textures accepted as shading rate attachments",
            Self::InclusiveLayerBound => "baseLayer equal to the layer limit is accepted",
            Self::IgnoreAspectRatio => "texel aspect ratio is not checked",
            Self::IgnoreCombinerEnums => "unknown combiner operators are accepted",
            Self::AllowNonTrivialCombiners => {
                "non-trivial combiners accepted while reported unsupported"
            }
            Self::FailTextureStorage => "glTexStorage2D raises GL_OUT_OF_MEMORY",
            Self::WrongErrorCode => "GL_INVALID_OPERATION reported instead of GL_INVALID_ENUM",
        }
    }
}

/// Reference driver configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    /// Extensions the driver exposes.
    pub extensions: ExtensionSupport,
    /// Shading rate attachment limits.
    pub limits: AttachmentLimits,
    /// Value of `FRAGMENT_SHADING_RATE_NON_TRIVIAL_COMBINERS_SUPPORTED_EXT`.
    pub non_trivial_combiners: bool,
    /// Rules to break.
    pub faults: Vec<Fault>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            extensions: ExtensionSupport::all(),
            limits: AttachmentLimits::default(),
            non_trivial_combiners: true,
            faults: Vec::new(),
        }
    }
}

/// A call made through the function table.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(dead_code)] // Payloads are read by tests
pub enum Call {
    GetError,
    ShadingRate(GLenum),
    ShadingRateCombinerOps(GLenum, GLenum),
    FramebufferShadingRate {
        target: GLenum,
        attachment: GLenum,
        texture: GLuint,
        base_layer: GLint,
        num_layers: GLsizei,
        texel_width: GLsizei,
        texel_height: GLsizei,
    },
    GenFramebuffers(GLsizei),
    BindFramebuffer(GLenum, GLuint),
    DeleteFramebuffers(Vec<GLuint>),
    GenTextures(GLsizei),
    BindTexture(GLenum, GLuint),
    DeleteTextures(Vec<GLuint>),
    TexStorage2D,
    TexImage2D,
    GetIntegerv(GLenum),
    GetBooleanv(GLenum),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Storage {
    Unspecified,
    Mutable,
    Immutable,
}

#[derive(Debug, Clone)]
struct Texture {
    target: Option<GLenum>,
    storage: Storage,
}

/// Shading rate attachment recorded on a framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(dead_code)] // Only `texture` is read outside tests
pub struct ShadingRateAttachment {
    pub texture: GLuint,
    pub base_layer: GLint,
    pub num_layers: GLsizei,
    pub texel_width: GLsizei,
    pub texel_height: GLsizei,
}

#[derive(Debug, Clone, Default)]
struct Framebuffer {
    shading_rate_attachment: Option<ShadingRateAttachment>,
}

/// Software implementation of the shading rate entry points.
#[derive(Debug)]
pub struct ReferenceDriver {
    config: DriverConfig,
    pending_error: GLenum,
    next_name: GLuint,
    framebuffers: HashMap<GLuint, Framebuffer>,
    textures: HashMap<GLuint, Texture>,
    draw_framebuffer: GLuint,
    read_framebuffer: GLuint,
    texture_2d: GLuint,
    shading_rate: GLenum,
    combiner_ops: [GLenum; 2],
    calls: Vec<Call>,
}

impl Default for ReferenceDriver {
    fn default() -> Self {
        Self::with_config_unchecked(DriverConfig::default())
    }
}

impl ReferenceDriver {
    /// Creates a driver with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns `DriverError` if the attachment limits are inconsistent.
    pub fn new(config: DriverConfig) -> Result<Self, DriverError> {
        config.limits.validate()?;
        Ok(Self::with_config_unchecked(config))
    }

    fn with_config_unchecked(config: DriverConfig) -> Self {
        Self {
            config,
            pending_error: GL_NO_ERROR,
            next_name: 1,
            framebuffers: HashMap::new(),
            textures: HashMap::new(),
            draw_framebuffer: 0,
            read_framebuffer: 0,
            texture_2d: 0,
            shading_rate: GL_SHADING_RATE_1X1_PIXELS_EXT,
            combiner_ops: [
                GL_FRAGMENT_SHADING_RATE_COMBINER_OP_KEEP_EXT,
                GL_FRAGMENT_SHADING_RATE_COMBINER_OP_KEEP_EXT,
            ],
            calls: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    /// Current `glShadingRateEXT` state.
    #[cfg(test)]
    pub fn current_shading_rate(&self) -> GLenum {
        self.shading_rate
    }

    /// Current `glShadingRateCombinerOpsEXT` state.
    #[cfg(test)]
    pub fn current_combiner_ops(&self) -> [GLenum; 2] {
        self.combiner_ops
    }

    /// Number of framebuffer names not yet deleted.
    #[cfg(test)]
    pub fn live_framebuffers(&self) -> usize {
        self.framebuffers.len()
    }

    /// Number of texture names not yet deleted.
    #[cfg(test)]
    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    /// The shading rate attachment of `framebuffer`, if any.
    #[cfg(test)]
    pub fn shading_rate_attachment(&self, framebuffer: GLuint) -> Option<ShadingRateAttachment> {
        self.framebuffers
            .get(&framebuffer)
            .and_then(|fb| fb.shading_rate_attachment)
    }

    /// Latches an error as if a previous call had raised it.
    #[cfg(test)]
    pub fn push_error(&mut self, error: GLenum) {
        self.raise(error);
    }

    fn has_fault(&self, fault: Fault) -> bool {
        self.config.faults.contains(&fault)
    }

    /// Records `error` unless an earlier one is still pending.
    fn raise(&mut self, error: GLenum) {
        let error = if error == GL_INVALID_ENUM && self.has_fault(Fault::WrongErrorCode) {
            GL_INVALID_OPERATION
        } else {
            error
        };
        if self.pending_error == GL_NO_ERROR {
            log::trace!("driver raised {}", ErrorCode::from_raw(error));
            self.pending_error = error;
        }
    }

    fn gen_names(&mut self, n: GLsizei) -> Option<Vec<GLuint>> {
        if n < 0 {
            self.raise(GL_INVALID_VALUE);
            return None;
        }
        let names = (0..n)
            .map(|_| {
                let name = self.next_name;
                self.next_name += 1;
                name
            })
            .collect();
        Some(names)
    }

    fn validate_shading_rate(&self, rate: GLenum) -> Result<(), GLenum> {
        if !self.config.extensions.fragment_shading_rate {
            return Err(GL_INVALID_OPERATION);
        }
        if !SHADING_RATES.contains(&rate) && !self.has_fault(Fault::AcceptAnyRate) {
            return Err(GL_INVALID_ENUM);
        }
        Ok(())
    }

    fn validate_combiner_ops(&self, op0: GLenum, op1: GLenum) -> Result<(), GLenum> {
        let ext = self.config.extensions;
        if !ext.fragment_shading_rate {
            return Err(GL_INVALID_OPERATION);
        }
        if !self.has_fault(Fault::IgnoreCombinerEnums)
            && (!COMBINER_OPS.contains(&op0) || !COMBINER_OPS.contains(&op1))
        {
            return Err(GL_INVALID_ENUM);
        }
        if !self.config.non_trivial_combiners
            && !self.has_fault(Fault::AllowNonTrivialCombiners)
            && (!is_trivial_combiner(op0) || !is_trivial_combiner(op1))
        {
            return Err(GL_INVALID_OPERATION);
        }
        if !ext.primitive && op0 != GL_FRAGMENT_SHADING_RATE_COMBINER_OP_KEEP_EXT {
            return Err(GL_INVALID_OPERATION);
        }
        if !ext.attachment && op1 != GL_FRAGMENT_SHADING_RATE_COMBINER_OP_KEEP_EXT {
            return Err(GL_INVALID_OPERATION);
        }
        Ok(())
    }

    /// Returns the framebuffer name bound to `target`.
    fn framebuffer_binding(&self, target: GLenum) -> Option<GLuint> {
        match target {
            GL_FRAMEBUFFER | GL_DRAW_FRAMEBUFFER => Some(self.draw_framebuffer),
            GL_READ_FRAMEBUFFER => Some(self.read_framebuffer),
            _ => None,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn validate_framebuffer_shading_rate(
        &self,
        target: GLenum,
        attachment: GLenum,
        texture: GLuint,
        base_layer: GLint,
        num_layers: GLsizei,
        texel_width: GLsizei,
        texel_height: GLsizei,
    ) -> Result<GLuint, GLenum> {
        let ext = self.config.extensions;
        if !ext.fragment_shading_rate || !ext.attachment {
            return Err(GL_INVALID_OPERATION);
        }
        let framebuffer = self.framebuffer_binding(target).ok_or(GL_INVALID_ENUM)?;
        if attachment != GL_SHADING_RATE_ATTACHMENT_EXT {
            return Err(GL_INVALID_ENUM);
        }
        if texture != 0 {
            let immutable = self
                .textures
                .get(&texture)
                .map(|t| t.storage == Storage::Immutable)
                .unwrap_or(false);
            let mutable_allowed = self.has_fault(Fault::AcceptMutableTexture)
                && self.textures.contains_key(&texture);
            if !immutable && !mutable_allowed {
                return Err(GL_INVALID_VALUE);
            }
        }

        let limits = &self.config.limits;
        let base_out_of_range = if self.has_fault(Fault::InclusiveLayerBound) {
            base_layer > limits.max_layers
        } else {
            base_layer >= limits.max_layers
        };
        if base_layer < 0 || base_out_of_range {
            return Err(GL_INVALID_VALUE);
        }
        if num_layers < 0 || num_layers > limits.max_layers {
            return Err(GL_INVALID_VALUE);
        }
        if texel_width < limits.min_texel_width
            || texel_width > limits.max_texel_width
            || texel_height < limits.min_texel_height
            || texel_height > limits.max_texel_height
        {
            return Err(GL_INVALID_VALUE);
        }
        if !self.has_fault(Fault::IgnoreAspectRatio) {
            // Both sizes are positive here.
            let ratio_limit = i64::from(limits.max_aspect_ratio);
            let (w, h) = (i64::from(texel_width), i64::from(texel_height));
            if w > h * ratio_limit || h > w * ratio_limit {
                return Err(GL_INVALID_VALUE);
            }
        }
        if framebuffer == 0 {
            return Err(GL_INVALID_OPERATION);
        }
        Ok(framebuffer)
    }

    fn integer_state(&self, pname: GLenum) -> Result<GLint, GLenum> {
        let ext = self.config.extensions;
        let limits = &self.config.limits;
        let value = match pname {
            GL_MIN_FRAGMENT_SHADING_RATE_ATTACHMENT_TEXEL_WIDTH_EXT => limits.min_texel_width,
            GL_MAX_FRAGMENT_SHADING_RATE_ATTACHMENT_TEXEL_WIDTH_EXT => limits.max_texel_width,
            GL_MIN_FRAGMENT_SHADING_RATE_ATTACHMENT_TEXEL_HEIGHT_EXT => limits.min_texel_height,
            GL_MAX_FRAGMENT_SHADING_RATE_ATTACHMENT_TEXEL_HEIGHT_EXT => limits.max_texel_height,
            GL_MAX_FRAGMENT_SHADING_RATE_ATTACHMENT_TEXEL_ASPECT_RATIO_EXT => {
                limits.max_aspect_ratio
            }
            GL_MAX_FRAGMENT_SHADING_RATE_ATTACHMENT_LAYERS_EXT => limits.max_layers,
            GL_SHADING_RATE_EXT if ext.fragment_shading_rate => return Ok(self.shading_rate as GLint),
            _ => return Err(GL_INVALID_ENUM),
        };
        if ext.fragment_shading_rate && ext.attachment {
            Ok(value)
        } else {
            Err(GL_INVALID_ENUM)
        }
    }
}

impl GlFunctions for ReferenceDriver {
    fn get_error(&mut self) -> GLenum {
        self.calls.push(Call::GetError);
        std::mem::replace(&mut self.pending_error, GL_NO_ERROR)
    }

    fn get_extensions(&self) -> Vec<String> {
        self.config.extensions.names()
    }

    fn shading_rate(&mut self, rate: GLenum) {
        self.calls.push(Call::ShadingRate(rate));
        match self.validate_shading_rate(rate) {
            Ok(()) => self.shading_rate = rate,
            Err(error) => self.raise(error),
        }
    }

    fn shading_rate_combiner_ops(&mut self, combiner_op0: GLenum, combiner_op1: GLenum) {
        self.calls
            .push(Call::ShadingRateCombinerOps(combiner_op0, combiner_op1));
        match self.validate_combiner_ops(combiner_op0, combiner_op1) {
            Ok(()) => {
                self.combiner_ops = [combiner_op0, combiner_op1];
                log::trace!("combiner ops set to {:#06X?}", self.combiner_ops);
            }
            Err(error) => self.raise(error),
        }
    }

    fn framebuffer_shading_rate(
        &mut self,
        target: GLenum,
        attachment: GLenum,
        texture: GLuint,
        base_layer: GLint,
        num_layers: GLsizei,
        texel_width: GLsizei,
        texel_height: GLsizei,
    ) {
        self.calls.push(Call::FramebufferShadingRate {
            target,
            attachment,
            texture,
            base_layer,
            num_layers,
            texel_width,
            texel_height,
        });
        let validated = self.validate_framebuffer_shading_rate(
            target,
            attachment,
            texture,
            base_layer,
            num_layers,
            texel_width,
            texel_height,
        );
        match validated {
            Ok(framebuffer) => {
                let record = (texture != 0).then_some(ShadingRateAttachment {
                    texture,
                    base_layer,
                    num_layers,
                    texel_width,
                    texel_height,
                });
                if let Some(fb) = self.framebuffers.get_mut(&framebuffer) {
                    fb.shading_rate_attachment = record;
                }
            }
            Err(error) => self.raise(error),
        }
    }

    fn gen_framebuffers(&mut self, n: GLsizei) -> Vec<GLuint> {
        self.calls.push(Call::GenFramebuffers(n));
        let names = self.gen_names(n).unwrap_or_default();
        for &name in &names {
            self.framebuffers.insert(name, Framebuffer::default());
        }
        names
    }

    fn bind_framebuffer(&mut self, target: GLenum, framebuffer: GLuint) {
        self.calls.push(Call::BindFramebuffer(target, framebuffer));
        if framebuffer != 0 && !self.framebuffers.contains_key(&framebuffer) {
            self.raise(GL_INVALID_OPERATION);
            return;
        }
        match target {
            GL_FRAMEBUFFER => {
                self.draw_framebuffer = framebuffer;
                self.read_framebuffer = framebuffer;
            }
            GL_DRAW_FRAMEBUFFER => self.draw_framebuffer = framebuffer,
            GL_READ_FRAMEBUFFER => self.read_framebuffer = framebuffer,
            _ => self.raise(GL_INVALID_ENUM),
        }
    }

    fn delete_framebuffers(&mut self, framebuffers: &[GLuint]) {
        self.calls.push(Call::DeleteFramebuffers(framebuffers.to_vec()));
        for name in framebuffers {
            if self.framebuffers.remove(name).is_some() {
                if self.draw_framebuffer == *name {
                    self.draw_framebuffer = 0;
                }
                if self.read_framebuffer == *name {
                    self.read_framebuffer = 0;
                }
            }
        }
    }

    fn gen_textures(&mut self, n: GLsizei) -> Vec<GLuint> {
        self.calls.push(Call::GenTextures(n));
        let names = self.gen_names(n).unwrap_or_default();
        for &name in &names {
            self.textures.insert(
                name,
                Texture {
                    target: None,
                    storage: Storage::Unspecified,
                },
            );
        }
        names
    }

    fn bind_texture(&mut self, target: GLenum, texture: GLuint) {
        self.calls.push(Call::BindTexture(target, texture));
        if target != GL_TEXTURE_2D {
            self.raise(GL_INVALID_ENUM);
            return;
        }
        if texture == 0 {
            self.texture_2d = 0;
            return;
        }
        match self.textures.get(&texture).map(|tex| tex.target) {
            None => self.raise(GL_INVALID_OPERATION),
            Some(Some(existing)) if existing != target => self.raise(GL_INVALID_OPERATION),
            Some(_) => {
                if let Some(tex) = self.textures.get_mut(&texture) {
                    tex.target = Some(target);
                }
                self.texture_2d = texture;
            }
        }
    }

    fn delete_textures(&mut self, textures: &[GLuint]) {
        self.calls.push(Call::DeleteTextures(textures.to_vec()));
        for name in textures {
            if self.textures.remove(name).is_some() {
                if self.texture_2d == *name {
                    self.texture_2d = 0;
                }
                for fb in self.framebuffers.values_mut() {
                    if fb.shading_rate_attachment.map(|a| a.texture) == Some(*name) {
                        fb.shading_rate_attachment = None;
                    }
                }
            }
        }
    }

    fn tex_storage_2d(
        &mut self,
        target: GLenum,
        levels: GLsizei,
        internal_format: GLenum,
        width: GLsizei,
        height: GLsizei,
    ) {
        self.calls.push(Call::TexStorage2D);
        if target != GL_TEXTURE_2D {
            self.raise(GL_INVALID_ENUM);
            return;
        }
        if internal_format != GL_R8 && internal_format != GL_R8UI {
            self.raise(GL_INVALID_ENUM);
            return;
        }
        if levels < 1 || width < 1 || height < 1 {
            self.raise(GL_INVALID_VALUE);
            return;
        }
        if self.has_fault(Fault::FailTextureStorage) {
            self.raise(GL_OUT_OF_MEMORY);
            return;
        }
        let bound = self.texture_2d;
        match self.textures.get_mut(&bound) {
            Some(tex) if tex.storage != Storage::Immutable => tex.storage = Storage::Immutable,
            _ => self.raise(GL_INVALID_OPERATION),
        }
    }

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
    ) {
        self.calls.push(Call::TexImage2D);
        if target != GL_TEXTURE_2D {
            self.raise(GL_INVALID_ENUM);
            return;
        }
        if (format != GL_RED && format != GL_RED_INTEGER) || ty != GL_UNSIGNED_BYTE {
            self.raise(GL_INVALID_ENUM);
            return;
        }
        let internal_format = internal_format as GLenum;
        if internal_format != GL_R8 && internal_format != GL_R8UI {
            self.raise(GL_INVALID_VALUE);
            return;
        }
        if level < 0 || width < 0 || height < 0 || border != 0 {
            self.raise(GL_INVALID_VALUE);
            return;
        }
        let integer_format = internal_format == GL_R8UI;
        if integer_format != (format == GL_RED_INTEGER) {
            self.raise(GL_INVALID_OPERATION);
            return;
        }
        let bound = self.texture_2d;
        match self.textures.get_mut(&bound) {
            Some(tex) if tex.storage != Storage::Immutable => tex.storage = Storage::Mutable,
            _ => self.raise(GL_INVALID_OPERATION),
        }
    }

    fn get_integerv(&mut self, pname: GLenum) -> Option<GLint> {
        self.calls.push(Call::GetIntegerv(pname));
        match self.integer_state(pname) {
            Ok(value) => Some(value),
            Err(error) => {
                self.raise(error);
                None
            }
        }
    }

    fn get_booleanv(&mut self, pname: GLenum) -> Option<GLboolean> {
        self.calls.push(Call::GetBooleanv(pname));
        if pname == GL_FRAGMENT_SHADING_RATE_NON_TRIVIAL_COMBINERS_SUPPORTED_EXT
            && self.config.extensions.fragment_shading_rate
        {
            Some(self.config.non_trivial_combiners)
        } else {
            self.raise(GL_INVALID_ENUM);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEEP: GLenum = GL_FRAGMENT_SHADING_RATE_COMBINER_OP_KEEP_EXT;
    const REPLACE: GLenum = GL_FRAGMENT_SHADING_RATE_COMBINER_OP_REPLACE_EXT;
    const MIN: GLenum = GL_FRAGMENT_SHADING_RATE_COMBINER_OP_MIN_EXT;
    const MUL: GLenum = GL_FRAGMENT_SHADING_RATE_COMBINER_OP_MUL_EXT;

    fn driver_with(config: DriverConfig) -> ReferenceDriver {
        ReferenceDriver::new(config).unwrap()
    }

    /// Framebuffer bound, one immutable and one mutable texture.
    fn attachment_setup(gl: &mut ReferenceDriver) -> (GLuint, GLuint, GLuint) {
        let fbo = gl.gen_framebuffers(1)[0];
        gl.bind_framebuffer(GL_FRAMEBUFFER, fbo);
        let textures = gl.gen_textures(2);
        gl.bind_texture(GL_TEXTURE_2D, textures[0]);
        gl.tex_storage_2d(GL_TEXTURE_2D, 1, GL_R8UI, 256, 256);
        gl.bind_texture(GL_TEXTURE_2D, textures[1]);
        gl.tex_image_2d(
            GL_TEXTURE_2D,
            0,
            GL_R8 as GLint,
            256,
            256,
            0,
            GL_RED,
            GL_UNSIGNED_BYTE,
        );
        assert_eq!(gl.get_error(), GL_NO_ERROR);
        (fbo, textures[0], textures[1])
    }

    #[test]
    fn test_default_limits_are_valid() {
        assert!(AttachmentLimits::default().validate().is_ok());
        assert!(ReferenceDriver::new(DriverConfig::default()).is_ok());
    }

    #[test]
    fn test_invalid_limits_rejected() {
        let mut config = DriverConfig::default();
        config.limits.min_texel_width = 64;
        assert_eq!(
            ReferenceDriver::new(config).unwrap_err(),
            DriverError::InvalidTexelRange {
                axis: "width",
                min: 64,
                max: 32
            }
        );

        let mut config = DriverConfig::default();
        config.limits.max_layers = 0;
        assert!(matches!(
            ReferenceDriver::new(config),
            Err(DriverError::InvalidLimit { name: "max layers", .. })
        ));
    }

    #[test]
    fn test_first_error_is_latched_until_read() {
        let mut gl = ReferenceDriver::default();
        gl.shading_rate(GL_SAMPLE_SHADING);
        gl.bind_framebuffer(GL_FRAMEBUFFER, 999);
        assert_eq!(gl.get_error(), GL_INVALID_ENUM);
        assert_eq!(gl.get_error(), GL_NO_ERROR);
    }

    #[test]
    fn test_shading_rate_validation() {
        let mut gl = ReferenceDriver::default();
        for rate in SHADING_RATES {
            gl.shading_rate(rate);
            assert_eq!(gl.get_error(), GL_NO_ERROR);
            assert_eq!(gl.current_shading_rate(), rate);
        }
        gl.shading_rate(GL_SAMPLE_SHADING);
        assert_eq!(gl.get_error(), GL_INVALID_ENUM);
        assert_eq!(gl.current_shading_rate(), GL_SHADING_RATE_4X4_PIXELS_EXT);
    }

    #[test]
    fn test_shading_rate_without_extension() {
        let mut gl = driver_with(DriverConfig {
            extensions: ExtensionSupport::none(),
            ..DriverConfig::default()
        });
        gl.shading_rate(GL_SHADING_RATE_2X2_PIXELS_EXT);
        assert_eq!(gl.get_error(), GL_INVALID_OPERATION);
        assert!(gl.get_extensions().is_empty());
    }

    #[test]
    fn test_combiner_enum_validation() {
        let mut gl = ReferenceDriver::default();
        gl.shading_rate_combiner_ops(GL_SHADING_RATE_EXT, REPLACE);
        assert_eq!(gl.get_error(), GL_INVALID_ENUM);
        gl.shading_rate_combiner_ops(KEEP, GL_MIN_FRAGMENT_SHADING_RATE_ATTACHMENT_TEXEL_WIDTH_EXT);
        assert_eq!(gl.get_error(), GL_INVALID_ENUM);
        gl.shading_rate_combiner_ops(MIN, MUL);
        assert_eq!(gl.get_error(), GL_NO_ERROR);
        assert_eq!(gl.current_combiner_ops(), [MIN, MUL]);
    }

    #[test]
    fn test_trivial_combiners_only() {
        let mut gl = driver_with(DriverConfig {
            non_trivial_combiners: false,
            ..DriverConfig::default()
        });
        assert_eq!(
            gl.get_booleanv(GL_FRAGMENT_SHADING_RATE_NON_TRIVIAL_COMBINERS_SUPPORTED_EXT),
            Some(false)
        );
        gl.shading_rate_combiner_ops(MIN, KEEP);
        assert_eq!(gl.get_error(), GL_INVALID_OPERATION);
        gl.shading_rate_combiner_ops(REPLACE, MUL);
        assert_eq!(gl.get_error(), GL_INVALID_OPERATION);
        gl.shading_rate_combiner_ops(REPLACE, REPLACE);
        assert_eq!(gl.get_error(), GL_NO_ERROR);
    }

    #[test]
    fn test_combiner_ops_need_companion_extensions() {
        let mut gl = driver_with(DriverConfig {
            extensions: ExtensionSupport {
                fragment_shading_rate: true,
                attachment: false,
                primitive: false,
            },
            ..DriverConfig::default()
        });
        gl.shading_rate_combiner_ops(REPLACE, KEEP);
        assert_eq!(gl.get_error(), GL_INVALID_OPERATION);
        gl.shading_rate_combiner_ops(KEEP, REPLACE);
        assert_eq!(gl.get_error(), GL_INVALID_OPERATION);
        gl.shading_rate_combiner_ops(KEEP, KEEP);
        assert_eq!(gl.get_error(), GL_NO_ERROR);
    }

    #[test]
    fn test_framebuffer_shading_rate_accepts_valid_attachment() {
        let mut gl = ReferenceDriver::default();
        let (fbo, immutable, _) = attachment_setup(&mut gl);
        gl.framebuffer_shading_rate(
            GL_FRAMEBUFFER,
            GL_SHADING_RATE_ATTACHMENT_EXT,
            immutable,
            0,
            1,
            16,
            16,
        );
        assert_eq!(gl.get_error(), GL_NO_ERROR);
        let attachment = gl.shading_rate_attachment(fbo).unwrap();
        assert_eq!(attachment.texture, immutable);
        assert_eq!(attachment.texel_width, 16);

        gl.delete_textures(&[immutable]);
        assert!(gl.shading_rate_attachment(fbo).is_none());
    }

    #[test]
    fn test_framebuffer_shading_rate_errors() {
        let mut gl = ReferenceDriver::default();
        let (_, immutable, mutable) = attachment_setup(&mut gl);
        let cases: [(GLenum, GLenum, GLuint, GLint, GLsizei, GLsizei, GLsizei, GLenum); 8] = [
            (GL_RENDERBUFFER, GL_SHADING_RATE_ATTACHMENT_EXT, immutable, 0, 1, 16, 16, GL_INVALID_ENUM),
            (GL_FRAMEBUFFER, GL_COLOR_ATTACHMENT0, immutable, 0, 1, 16, 16, GL_INVALID_ENUM),
            (GL_FRAMEBUFFER, GL_SHADING_RATE_ATTACHMENT_EXT, mutable, 0, 1, 16, 16, GL_INVALID_VALUE),
            (GL_FRAMEBUFFER, GL_SHADING_RATE_ATTACHMENT_EXT, 4242, 0, 1, 16, 16, GL_INVALID_VALUE),
            (GL_FRAMEBUFFER, GL_SHADING_RATE_ATTACHMENT_EXT, immutable, 1, 1, 16, 16, GL_INVALID_VALUE),
            (GL_FRAMEBUFFER, GL_SHADING_RATE_ATTACHMENT_EXT, immutable, 0, 2, 16, 16, GL_INVALID_VALUE),
            (GL_FRAMEBUFFER, GL_SHADING_RATE_ATTACHMENT_EXT, immutable, 0, 1, 8, 32, GL_INVALID_VALUE),
            (GL_FRAMEBUFFER, GL_SHADING_RATE_ATTACHMENT_EXT, immutable, 0, 1, 4, 4, GL_INVALID_VALUE),
        ];
        for (target, attachment, texture, base, layers, w, h, expected) in cases {
            gl.framebuffer_shading_rate(target, attachment, texture, base, layers, w, h);
            assert_eq!(
                gl.get_error(),
                expected,
                "target {:#x} attachment {:#x} texture {} base {} layers {} texel {}x{}",
                target,
                attachment,
                texture,
                base,
                layers,
                w,
                h
            );
        }
    }

    #[test]
    fn test_framebuffer_shading_rate_on_default_framebuffer() {
        let mut gl = ReferenceDriver::default();
        let textures = gl.gen_textures(1);
        gl.bind_texture(GL_TEXTURE_2D, textures[0]);
        gl.tex_storage_2d(GL_TEXTURE_2D, 1, GL_R8UI, 64, 64);
        gl.framebuffer_shading_rate(
            GL_DRAW_FRAMEBUFFER,
            GL_SHADING_RATE_ATTACHMENT_EXT,
            textures[0],
            0,
            1,
            16,
            16,
        );
        assert_eq!(gl.get_error(), GL_INVALID_OPERATION);
    }

    #[test]
    fn test_immutable_texture_cannot_be_respecified() {
        let mut gl = ReferenceDriver::default();
        let textures = gl.gen_textures(1);
        gl.bind_texture(GL_TEXTURE_2D, textures[0]);
        gl.tex_storage_2d(GL_TEXTURE_2D, 1, GL_R8UI, 64, 64);
        assert_eq!(gl.get_error(), GL_NO_ERROR);
        gl.tex_storage_2d(GL_TEXTURE_2D, 1, GL_R8UI, 64, 64);
        assert_eq!(gl.get_error(), GL_INVALID_OPERATION);
        gl.tex_image_2d(
            GL_TEXTURE_2D,
            0,
            GL_R8 as GLint,
            64,
            64,
            0,
            GL_RED,
            GL_UNSIGNED_BYTE,
        );
        assert_eq!(gl.get_error(), GL_INVALID_OPERATION);
    }

    #[test]
    fn test_object_lifecycle() {
        let mut gl = ReferenceDriver::default();
        assert!(gl.gen_framebuffers(-1).is_empty());
        assert_eq!(gl.get_error(), GL_INVALID_VALUE);

        let fbos = gl.gen_framebuffers(2);
        let textures = gl.gen_textures(1);
        assert_eq!(gl.live_framebuffers(), 2);
        assert_eq!(gl.live_textures(), 1);

        gl.bind_texture(GL_TEXTURE_2D, 77);
        assert_eq!(gl.get_error(), GL_INVALID_OPERATION);

        gl.delete_framebuffers(&fbos);
        gl.delete_textures(&textures);
        assert_eq!(gl.live_framebuffers(), 0);
        assert_eq!(gl.live_textures(), 0);

        gl.bind_framebuffer(GL_FRAMEBUFFER, fbos[0]);
        assert_eq!(gl.get_error(), GL_INVALID_OPERATION);
    }

    #[test]
    fn test_limit_queries() {
        let mut gl = ReferenceDriver::default();
        assert_eq!(
            gl.get_integerv(GL_MAX_FRAGMENT_SHADING_RATE_ATTACHMENT_LAYERS_EXT),
            Some(1)
        );
        assert_eq!(
            gl.get_integerv(GL_MAX_FRAGMENT_SHADING_RATE_ATTACHMENT_TEXEL_ASPECT_RATIO_EXT),
            Some(2)
        );
        assert_eq!(gl.get_integerv(GL_SAMPLE_SHADING), None);
        assert_eq!(gl.get_error(), GL_INVALID_ENUM);

        let mut gl = driver_with(DriverConfig {
            extensions: ExtensionSupport {
                attachment: false,
                ..ExtensionSupport::all()
            },
            ..DriverConfig::default()
        });
        assert_eq!(
            gl.get_integerv(GL_MIN_FRAGMENT_SHADING_RATE_ATTACHMENT_TEXEL_WIDTH_EXT),
            None
        );
        assert_eq!(gl.get_error(), GL_INVALID_ENUM);
    }

    #[test]
    fn test_faults_relax_rules() {
        let mut gl = driver_with(DriverConfig {
            faults: vec![
                Fault::AcceptAnyRate,
                Fault::AcceptMutableTexture,
                Fault::InclusiveLayerBound,
                Fault::IgnoreAspectRatio,
            ],
            ..DriverConfig::default()
        });
        let (_, immutable, mutable) = attachment_setup(&mut gl);

        gl.shading_rate(GL_SAMPLE_SHADING);
        assert_eq!(gl.get_error(), GL_NO_ERROR);

        gl.framebuffer_shading_rate(GL_FRAMEBUFFER, GL_SHADING_RATE_ATTACHMENT_EXT, mutable, 0, 1, 16, 16);
        assert_eq!(gl.get_error(), GL_NO_ERROR);

        gl.framebuffer_shading_rate(GL_FRAMEBUFFER, GL_SHADING_RATE_ATTACHMENT_EXT, immutable, 1, 1, 16, 16);
        assert_eq!(gl.get_error(), GL_NO_ERROR);

        gl.framebuffer_shading_rate(GL_FRAMEBUFFER, GL_SHADING_RATE_ATTACHMENT_EXT, immutable, 0, 1, 8, 32);
        assert_eq!(gl.get_error(), GL_NO_ERROR);
    }

    #[test]
    fn test_wrong_error_code_fault() {
        let mut gl = driver_with(DriverConfig {
            faults: vec![Fault::WrongErrorCode],
            ..DriverConfig::default()
        });
        gl.shading_rate(GL_SAMPLE_SHADING);
        assert_eq!(gl.get_error(), GL_INVALID_OPERATION);
    }

    #[test]
    fn test_fail_texture_storage_fault() {
        let mut gl = driver_with(DriverConfig {
            faults: vec![Fault::FailTextureStorage],
            ..DriverConfig::default()
        });
        let textures = gl.gen_textures(1);
        gl.bind_texture(GL_TEXTURE_2D, textures[0]);
        gl.tex_storage_2d(GL_TEXTURE_2D, 1, GL_R8UI, 256, 256);
        assert_eq!(gl.get_error(), GL_OUT_OF_MEMORY);
    }

    #[test]
    fn test_fault_names_unique() {
        let faults = Fault::all_faults();
        let mut names: Vec<&str> = faults.iter().map(|f| f.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), faults.len());
        for fault in faults {
            let value = fault.to_possible_value().unwrap();
            assert_eq!(value.get_name(), fault.name());
            assert!(!fault.description().is_empty());
        }
    }

    #[test]
    fn test_calls_are_recorded() {
        let mut gl = ReferenceDriver::default();
        gl.shading_rate(GL_SHADING_RATE_2X2_PIXELS_EXT);
        gl.get_error();
        assert_eq!(
            gl.calls(),
            &[
                Call::ShadingRate(GL_SHADING_RATE_2X2_PIXELS_EXT),
                Call::GetError
            ]
        );
    }
}
