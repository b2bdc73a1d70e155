use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];
pub const VIDEO_EXTENSIONS: [&str; 2] = ["mp4", "mov"];

/// Processing path an upload takes, decided by its file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadKind {
    Image,
    Video,
}

impl UploadKind {
    /// Case-insensitive extension lookup; `None` for anything that is not a supported upload.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let extension = Path::new(filename)
            .extension()?
            .to_str()?
            .to_ascii_lowercase();
        if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            Some(UploadKind::Image)
        } else if VIDEO_EXTENSIONS.contains(&extension.as_str()) {
            Some(UploadKind::Video)
        } else {
            None
        }
    }

    pub fn is_video(self) -> bool {
        self == UploadKind::Video
    }
}

/// Every supported upload under `root`, sorted by path. A file path is returned as-is when it is
/// supported.
pub fn collect_uploads(root: &Path) -> Vec<PathBuf> {
    let mut uploads: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                log::warn!("skipping unreadable entry: {}", err);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .and_then(UploadKind::from_filename)
                .is_some()
        })
        .map(|entry| entry.into_path())
        .collect();
    uploads.sort();
    uploads
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn extension_decides_the_path() {
        use UploadKind::{Image, Video};
        assert_eq!(UploadKind::from_filename("demo.jpg"), Some(Image));
        assert_eq!(UploadKind::from_filename("DEMO.JPEG"), Some(Image));
        assert_eq!(UploadKind::from_filename("shot.Png"), Some(Image));
        assert_eq!(UploadKind::from_filename("clip.mp4"), Some(Video));
        assert_eq!(UploadKind::from_filename("clip.MOV"), Some(Video));
        assert!(UploadKind::from_filename("clip.mp4").unwrap().is_video());
    }

    #[test]
    fn unsupported_uploads_are_rejected() {
        assert_eq!(UploadKind::from_filename("notes.txt"), None);
        assert_eq!(UploadKind::from_filename("clip.avi"), None);
        assert_eq!(UploadKind::from_filename("jpg"), None);
        assert_eq!(UploadKind::from_filename(""), None);
    }

    #[test]
    fn collects_supported_files_recursively() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        for name in ["b.png", "a.mp4", "skip.txt", "nested/c.JPG"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        let uploads = collect_uploads(dir.path());
        let names: Vec<String> = uploads
            .iter()
            .map(|path| path.strip_prefix(dir.path()).unwrap())
            .map(|relative| relative.to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(names, vec!["a.mp4", "b.png", "nested/c.JPG"]);
    }

    #[test]
    fn single_file_root() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("one.jpeg");
        fs::write(&path, b"x").unwrap();
        assert_eq!(collect_uploads(&path), vec![path]);
    }
}
