//! Directory walking implementation using walkdir.

use super::{filter::ImageFilter, PhotoFile, PhotoScanner, ScanResult};
use crate::error::ScanError;
use crate::events::{Event, EventSender, ScanEvent};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Configuration for the directory scanner
#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Whether to include hidden files and directories
    pub include_hidden: bool,
    /// Maximum directory depth (None = unlimited)
    pub max_depth: Option<usize>,
    /// Custom extensions to include (None = use defaults)
    pub extensions: Option<Vec<String>>,
}

/// Scanner implementation using the walkdir crate
pub struct WalkDirScanner {
    config: ScanConfig,
    filter: ImageFilter,
}

impl WalkDirScanner {
    /// Create a new scanner with the given configuration
    pub fn new(config: ScanConfig) -> Self {
        let mut filter = ImageFilter::new().with_hidden(config.include_hidden);

        if let Some(ref extensions) = config.extensions {
            filter = filter.with_extensions(extensions.clone());
        }

        Self { config, filter }
    }

    fn is_hidden_dir(&self, path: &Path, root: &Path) -> bool {
        !self.config.include_hidden
            && path != root
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| name.starts_with('.'))
    }

    /// Scan a single directory.
    ///
    /// Files already in `seen` (by canonical path) are skipped, so a file
    /// reachable from several roots gets a single index.
    fn scan_directory(
        &self,
        root: &Path,
        seen: &mut HashSet<PathBuf>,
        events: &EventSender,
    ) -> Result<(Vec<PhotoFile>, Vec<ScanError>), ScanError> {
        if !root.is_dir() {
            return Err(ScanError::DirectoryNotFound {
                path: root.to_path_buf(),
            });
        }

        let mut photos = Vec::new();
        let mut errors = Vec::new();

        let mut walker = WalkDir::new(root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name();

        if let Some(depth) = self.config.max_depth {
            walker = walker.max_depth(depth);
        }

        let entries = walker
            .into_iter()
            .filter_entry(|entry| !(entry.file_type().is_dir() && self.is_hidden_dir(entry.path(), root)));

        for entry_result in entries {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map(|p| p.to_path_buf()).unwrap_or_default();
                    let error = if e.io_error().map(|e| e.kind())
                        == Some(std::io::ErrorKind::PermissionDenied)
                    {
                        ScanError::PermissionDenied { path: path.clone() }
                    } else {
                        ScanError::ReadDirectory {
                            path: path.clone(),
                            source: std::io::Error::other(e.to_string()),
                        }
                    };

                    events.send(Event::Scan(ScanEvent::Error {
                        path,
                        message: error.to_string(),
                    }));
                    errors.push(error);
                    continue;
                }
            };

            let path = entry.path();
            if entry.file_type().is_dir() || !self.filter.should_include(path) {
                continue;
            }

            let key = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
            if !seen.insert(key) {
                continue;
            }

            match fs::metadata(path) {
                Ok(metadata) => {
                    let photo = PhotoFile::new(path, metadata.len());
                    events.send(Event::Scan(ScanEvent::PhotoFound {
                        path: photo.path.clone(),
                    }));
                    photos.push(photo);
                }
                Err(e) => {
                    let error = ScanError::ReadDirectory {
                        path: path.to_path_buf(),
                        source: e,
                    };
                    events.send(Event::Scan(ScanEvent::Error {
                        path: path.to_path_buf(),
                        message: error.to_string(),
                    }));
                    errors.push(error);
                }
            }
        }

        Ok((photos, errors))
    }
}

impl PhotoScanner for WalkDirScanner {
    fn scan(&self, paths: &[PathBuf]) -> Result<ScanResult, ScanError> {
        self.scan_with_events(paths, &crate::events::null_sender())
    }

    fn scan_with_events(
        &self,
        paths: &[PathBuf],
        events: &EventSender,
    ) -> Result<ScanResult, ScanError> {
        events.send(Event::Scan(ScanEvent::Started {
            paths: paths.to_vec(),
        }));

        let mut all_photos = Vec::new();
        let mut all_errors = Vec::new();
        let mut seen = HashSet::new();

        for path in paths {
            match self.scan_directory(path, &mut seen, events) {
                Ok((photos, errors)) => {
                    all_photos.extend(photos);
                    all_errors.extend(errors);
                }
                Err(e) => all_errors.push(e),
            }
        }

        events.send(Event::Scan(ScanEvent::Completed {
            total_photos: all_photos.len(),
        }));

        Ok(ScanResult {
            photos: all_photos,
            errors: all_errors,
        })
    }
}
