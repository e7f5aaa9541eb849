use std::{
    collections::BTreeMap,
    fmt,
    fs::File,
    io,
    path::{Path, PathBuf},
};

use thiserror::Error;

use crate::logical_path::{clean_path, is_well_formed, logical_name, logical_segments};

/// Failures reported by the virtual filesystem.
#[derive(Debug, Error)]
pub enum VfsError {
    #[error("open {path}: invalid argument")]
    InvalidPath { path: String },
    #[error("open {path}: file does not exist")]
    NotFound { path: String },
    #[error("upload path '{path}' is not valid UTF-8")]
    NonUtf8Path { path: PathBuf },
    #[error("failed to resolve current directory: {0}")]
    CurrentDir(#[source] io::Error),
    #[error("open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Segment trie from logical names to the real paths registered for them.
#[derive(Debug, Default, Clone)]
struct MappingNode {
    target: Option<PathBuf>,
    children: BTreeMap<String, MappingNode>,
}

impl MappingNode {
    fn insert(&mut self, segments: &[String], target: PathBuf) {
        let mut node = self;
        for segment in segments {
            node = node.children.entry(segment.clone()).or_default();
        }
        node.target = Some(target);
    }

    /// Deepest registered node along `segments`, with the number of segments
    /// it consumed. An exact registration is the deepest possible match.
    fn longest_match(&self, segments: &[String]) -> Option<(&Path, usize)> {
        let mut node = self;
        let mut best = None;
        for (depth, segment) in segments.iter().enumerate() {
            let Some(child) = node.children.get(segment) else {
                break;
            };
            node = child;
            if let Some(target) = node.target.as_deref() {
                best = Some((target, depth + 1));
            }
        }
        best
    }
}

/// Read-only, name-sandboxed view over a fixed set of real paths.
///
/// Built once per session and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct VirtualFs {
    root_passthrough: bool,
    mapping: MappingNode,
    names: BTreeMap<String, PathBuf>,
}

impl VirtualFs {
    /// Registers upload paths relative to the process working directory.
    pub fn from_upload_paths(paths: &[PathBuf]) -> Result<Self, VfsError> {
        let cwd = std::env::current_dir().map_err(VfsError::CurrentDir)?;
        Self::from_upload_paths_in(paths, &cwd)
    }

    /// Registers upload paths, resolving relative ones against `cwd`.
    pub fn from_upload_paths_in(paths: &[PathBuf], cwd: &Path) -> Result<Self, VfsError> {
        let cwd = utf8(cwd)?;
        let mut vfs = Self::default();
        for path in paths {
            let raw = utf8(path)?;
            let absolute = if raw.starts_with('/') {
                clean_path(raw)
            } else {
                clean_path(&format!("{cwd}/{raw}"))
            };
            if absolute == "/" {
                tracing::warn!(upload_path = raw, "upload root passthrough registered");
                vfs.root_passthrough = true;
                continue;
            }
            let name = logical_name(raw, Some(&absolute));
            vfs.register(&name, PathBuf::from(absolute));
        }
        Ok(vfs)
    }

    /// Registers `real` under the canonical form of `logical`.
    pub fn register(&mut self, logical: &str, real: impl Into<PathBuf>) {
        let real = real.into();
        let segments = logical_segments(logical);
        if segments.is_empty() {
            return;
        }
        tracing::debug!(logical = %segments.join("/"), real = %real.display(), "upload path registered");
        self.names.insert(segments.join("/"), real.clone());
        self.mapping.insert(&segments, real);
    }

    /// Grants unrestricted passthrough to the real filesystem.
    pub fn allow_root_passthrough(&mut self) {
        self.root_passthrough = true;
    }

    pub fn has_root_passthrough(&self) -> bool {
        self.root_passthrough
    }

    pub fn is_empty(&self) -> bool {
        !self.root_passthrough && self.names.is_empty()
    }

    /// Registered logical names in lexical order.
    pub fn logical_names(&self) -> impl Iterator<Item = &str> {
        self.names.keys().map(String::as_str)
    }

    /// Maps a logical request to the real path it may read.
    pub fn resolve(&self, request: &str) -> Result<PathBuf, VfsError> {
        if !is_well_formed(request) {
            return Err(VfsError::InvalidPath {
                path: request.to_string(),
            });
        }
        let segments = logical_segments(request);
        if segments.is_empty() {
            return Err(VfsError::InvalidPath {
                path: request.to_string(),
            });
        }

        if self.root_passthrough {
            return Ok(PathBuf::from(format!("/{}", segments.join("/"))));
        }

        let Some((target, consumed)) = self.mapping.longest_match(&segments) else {
            return Err(VfsError::NotFound {
                path: request.to_string(),
            });
        };
        let mut resolved = target.to_path_buf();
        for segment in &segments[consumed..] {
            resolved.push(segment);
        }
        Ok(resolved)
    }

    /// Opens the real file behind a logical request.
    pub fn open(&self, request: &str) -> Result<File, VfsError> {
        let path = self.resolve(request)?;
        File::open(&path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                VfsError::NotFound {
                    path: request.to_string(),
                }
            } else {
                VfsError::Io { path, source }
            }
        })
    }
}

impl fmt::Display for VirtualFs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = Vec::new();
        if self.root_passthrough {
            names.push("/");
        }
        names.extend(self.logical_names());
        write!(f, "[{}]", names.join(","))
    }
}

fn utf8(path: &Path) -> Result<&str, VfsError> {
    path.to_str().ok_or_else(|| VfsError::NonUtf8Path {
        path: path.to_path_buf(),
    })
}
