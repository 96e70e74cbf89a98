use std::borrow::Cow;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub const GEOMETRY_VERT: &str = "geometry.vert.wgsl";
pub const PATH_VERT: &str = "path.vert.wgsl";
pub const SOLID_FRAG: &str = "solid.frag.wgsl";
pub const CIRCLE_FRAG: &str = "circle.frag.wgsl";
pub const CIRCLE_FILLED_FRAG: &str = "circle_filled.frag.wgsl";
pub const TEXTURE_FRAG: &str = "texture.frag.wgsl";
pub const MIPMAP: &str = "mipmap.wgsl";

/// Mipmap blit source. Always embedded: mip generation lives in the device
/// context, which has no shader library.
pub(crate) const MIPMAP_SOURCE: &str = include_str!("shaders/mipmap.wgsl");

const EMBEDDED: &[(&str, &str)] = &[
    (GEOMETRY_VERT, include_str!("shaders/geometry.vert.wgsl")),
    (PATH_VERT, include_str!("shaders/path.vert.wgsl")),
    (SOLID_FRAG, include_str!("shaders/solid.frag.wgsl")),
    (CIRCLE_FRAG, include_str!("shaders/circle.frag.wgsl")),
    (CIRCLE_FILLED_FRAG, include_str!("shaders/circle_filled.frag.wgsl")),
    (TEXTURE_FRAG, include_str!("shaders/texture.frag.wgsl")),
    (MIPMAP, MIPMAP_SOURCE),
];

/// Resolves WGSL sources by file name.
///
/// Sources are compiled into the binary. With a directory set, every lookup
/// reads `<dir>/<name>` instead and a missing file is an error.
#[derive(Debug, Clone, Default)]
pub struct ShaderLibrary {
    dir: Option<PathBuf>,
}

impl ShaderLibrary {
    pub fn embedded() -> Self {
        Self { dir: None }
    }

    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    pub fn source(&self, name: &str) -> Result<Cow<'static, str>> {
        match &self.dir {
            Some(dir) => {
                let path = dir.join(name);
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read shader {}", path.display()))?;
                Ok(Cow::Owned(text))
            }
            None => EMBEDDED
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, src)| Cow::Borrowed(*src))
                .with_context(|| format!("unknown shader '{name}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_sources_resolve_by_name() {
        let lib = ShaderLibrary::embedded();
        for name in [
            GEOMETRY_VERT,
            PATH_VERT,
            SOLID_FRAG,
            CIRCLE_FRAG,
            CIRCLE_FILLED_FRAG,
            TEXTURE_FRAG,
            MIPMAP,
        ] {
            let src = lib.source(name).unwrap();
            assert!(src.contains("fn "), "{name} looks empty");
        }
    }

    #[test]
    fn unknown_name_is_an_error() {
        assert!(ShaderLibrary::embedded().source("nope.wgsl").is_err());
    }

    #[test]
    fn directory_override_reads_files() {
        let dir = std::env::temp_dir().join(format!("kiln-shaders-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(SOLID_FRAG), "// custom").unwrap();

        let lib = ShaderLibrary::from_dir(&dir);
        assert_eq!(lib.source(SOLID_FRAG).unwrap(), "// custom");

        // No fallback to the embedded copy.
        assert!(lib.source(CIRCLE_FRAG).is_err());

        let _ = std::fs::remove_dir_all(dir);
    }
}
