use core::fmt;

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Api {
    Gl,
    Gles,
}

/// The graphics API a script targets. Versions are only ordered within the
/// same API; cross-API comparisons are meaningless and never asked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ApiVersion {
    pub api: Api,
    pub major: u32,
    pub minor: u32,
}

impl ApiVersion {
    pub fn new(api: Api, major: u32, minor: u32) -> Self {
        Self { api, major, minor }
    }

    fn at_least(&self, api: Api, major: u32, minor: u32) -> bool {
        self.api == api && (self.major, self.minor) >= (major, minor)
    }

    /// Compute shaders arrived in GL 4.3 and GLES 3.1.
    pub fn supports_compute_shaders(&self) -> bool {
        self.at_least(Api::Gl, 4, 3) || self.at_least(Api::Gles, 3, 1)
    }

    /// GLES 2.0 has a single color attachment, so only key 0 is usable.
    pub fn restricts_framebuffer_attachments_to_zero(&self) -> bool {
        *self == ApiVersion::new(Api::Gles, 2, 0)
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let api = match self.api {
            Api::Gl => "GL",
            Api::Gles => "GLES",
        };
        write!(f, "{} {}.{}", api, self.major, self.minor)
    }
}

#[cfg(test)]
mod tests {
    use super::{Api, ApiVersion};

    #[test]
    fn compute_shader_availability() {
        assert!(!ApiVersion::new(Api::Gl, 4, 2).supports_compute_shaders());
        assert!(ApiVersion::new(Api::Gl, 4, 3).supports_compute_shaders());
        assert!(ApiVersion::new(Api::Gl, 4, 6).supports_compute_shaders());
        assert!(!ApiVersion::new(Api::Gles, 3, 0).supports_compute_shaders());
        assert!(ApiVersion::new(Api::Gles, 3, 1).supports_compute_shaders());
    }

    #[test]
    fn gles2_attachment_restriction() {
        assert!(ApiVersion::new(Api::Gles, 2, 0).restricts_framebuffer_attachments_to_zero());
        assert!(!ApiVersion::new(Api::Gles, 3, 0).restricts_framebuffer_attachments_to_zero());
        assert!(!ApiVersion::new(Api::Gl, 4, 0).restricts_framebuffer_attachments_to_zero());
    }

    #[test]
    fn display() {
        assert_eq!(ApiVersion::new(Api::Gles, 3, 2).to_string(), "GLES 3.2");
        assert_eq!(ApiVersion::new(Api::Gl, 4, 5).to_string(), "GL 4.5");
    }
}
