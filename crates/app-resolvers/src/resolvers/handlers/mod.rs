use once_cell::sync::Lazy;

use super::Resolver;

pub mod fallthrough;
pub mod gofile;
pub mod google_drive;
pub mod mediafire;
pub mod mega;
pub mod pixeldrain;
pub mod sourceforge;

/// Resolvers in dispatch priority order. The first one whose
/// `can_resolve` matches handles the job; the fallthrough resolver at
/// the end accepts any plain http(s) URL.
pub static AVAILABLE_RESOLVERS: Lazy<Vec<Box<dyn Resolver>>> = Lazy::new(|| {
    vec![
        Box::new(google_drive::GoogleDriveResolver),
        Box::new(mega::MegaResolver),
        Box::new(pixeldrain::PixeldrainResolver),
        Box::new(gofile::GoFileResolver),
        Box::new(mediafire::MediaFireResolver),
        Box::new(sourceforge::SourceForgeResolver),
        Box::new(fallthrough::FallthroughResolver),
    ]
});

#[cfg(test)]
mod tests {
    use std::{path::PathBuf, time::Duration};

    use url::Url;

    use crate::resolvers::{find_resolver, ResolveRequest};

    fn request_for(url: &str) -> ResolveRequest {
        ResolveRequest::new(
            Url::parse(url).expect("test url"),
            PathBuf::from("."),
            Duration::from_secs(300),
        )
    }

    #[track_caller]
    fn assert_dispatches_to(url: &str, expected: &str) {
        let request = request_for(url);

        for _ in 0..3 {
            let resolver = find_resolver(&request)
                .unwrap_or_else(|| panic!("no resolver for {url}"));
            assert_eq!(resolver.name(), expected, "for {url}");
        }
    }

    #[test]
    fn each_host_selects_its_documented_resolver() {
        assert_dispatches_to("https://drive.google.com/file/d/abc123/view", "google-drive");
        assert_dispatches_to("https://mega.nz/file/ABC123#keykeykey", "mega");
        assert_dispatches_to("https://pixeldrain.com/u/abcd1234", "pixeldrain");
        assert_dispatches_to("https://gofile.io/d/AbCd12", "gofile");
        assert_dispatches_to("https://www.mediafire.com/file/xyz/archive.zip/file", "mediafire");
        assert_dispatches_to(
            "https://sourceforge.net/projects/sevenzip/files/7-Zip/23.01/7z2301.exe/download",
            "sourceforge",
        );
        assert_dispatches_to("https://example.com/files/data.bin", "fallthrough");
    }

    #[test]
    fn pixeldrain_list_pages_fall_through() {
        // Only /u/ single-file pages have a direct API mapping.
        assert_dispatches_to("https://pixeldrain.com/l/somelist", "fallthrough");
    }

    #[test]
    fn non_http_schemes_match_nothing() {
        let request = request_for("ftp://example.com/file.bin");
        assert!(find_resolver(&request).is_none());
    }
}
