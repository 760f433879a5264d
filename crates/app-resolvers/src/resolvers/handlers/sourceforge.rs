use tracing::debug;
use url::Url;

use super::super::{Resolution, ResolveRequest, Resolver};
use crate::{common::Client, error::ResolverError, report::ProgressReporter};

const MIRROR_CHOICES_URL: &str = "https://sourceforge.net/settings/mirror_choices";

/// SourceForge fronts every file with a mirror-selection page. Rather
/// than letting it pick, scrape the mirror list and hand every
/// candidate to the fetcher, which walks them in order until one
/// works.
#[derive(Debug, Default)]
pub struct SourceForgeResolver;

#[async_trait::async_trait]
impl Resolver for SourceForgeResolver {
    fn name(&self) -> &'static str {
        "sourceforge"
    }

    fn description(&self) -> &'static str {
        "Expands SourceForge file pages into per-mirror download URLs"
    }

    fn can_resolve(&self, request: &ResolveRequest) -> bool {
        matches!(request.host(), "sourceforge.net" | "www.sourceforge.net")
            && request.url.path().starts_with("/projects/")
    }

    async fn resolve(
        &self,
        request: &ResolveRequest,
        reporter: &dyn ProgressReporter,
    ) -> Result<Resolution, ResolverError> {
        let (project, file_path) = project_and_file(&request.url).ok_or_else(|| {
            ResolverError::page("SourceForge URL does not point at a project file")
        })?;

        reporter
            .update("🔄 *Collecting SourceForge mirrors...*")
            .await;

        let mirror_page = Client::base()?
            .get(MIRROR_CHOICES_URL)
            .query(&[("projectname", project.as_str()), ("filename", file_path.as_str())])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let mirrors = parse_mirrors(&mirror_page);
        debug!(?mirrors, "Scraped mirror list");

        let urls = candidate_urls(&mirrors, &project, &file_path);
        let file_name = file_path.rsplit('/').next().map(ToString::to_string);

        Ok(Resolution::Resolved { urls, file_name })
    }
}

/// `/projects/<project>/files/<path...>[/download]` → project + path.
fn project_and_file(url: &Url) -> Option<(String, String)> {
    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());

    if segments.next()? != "projects" {
        return None;
    }
    let project = segments.next()?.to_string();

    if segments.next()? != "files" {
        return None;
    }

    let mut parts: Vec<&str> = segments.collect();
    if parts.last() == Some(&"download") {
        parts.pop();
    }

    if parts.is_empty() {
        return None;
    }

    Some((project, parts.join("/")))
}

fn parse_mirrors(html: &str) -> Vec<String> {
    let Ok(dom) = tl::parse(html, tl::ParserOptions::default()) else {
        return Vec::new();
    };
    let parser = dom.parser();

    let Some(list) = dom
        .get_element_by_id("mirrorList")
        .and_then(|handle| handle.get(parser))
        .and_then(|node| node.as_tag())
    else {
        return Vec::new();
    };

    let Some(items) = list.query_selector(parser, "li") else {
        return Vec::new();
    };

    items
        .filter_map(|handle| {
            let tag = handle.get(parser)?.as_tag()?;
            let id = tag.attributes().id()?.as_utf8_str();
            let id = id.trim().to_string();

            // "autoselect" is the page's own round-robin entry, not a
            // mirror.
            if id.is_empty() || id == "autoselect" {
                None
            } else {
                Some(id)
            }
        })
        .collect()
}

fn candidate_urls(mirrors: &[String], project: &str, file_path: &str) -> Vec<String> {
    let mut urls = mirrors
        .iter()
        .map(|mirror| format!("https://{mirror}.dl.sourceforge.net/project/{project}/{file_path}"))
        .collect::<Vec<_>>();

    // The generic redirector works even when mirror scraping comes up
    // empty.
    urls.push(format!(
        "https://downloads.sourceforge.net/project/{project}/{file_path}"
    ));

    urls
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_project_urls() {
        let url = Url::parse(
            "https://sourceforge.net/projects/sevenzip/files/7-Zip/23.01/7z2301.exe/download",
        )
        .expect("url");

        assert_eq!(
            project_and_file(&url),
            Some(("sevenzip".to_string(), "7-Zip/23.01/7z2301.exe".to_string()))
        );
    }

    #[test]
    fn download_suffix_is_optional() {
        let url = Url::parse("https://sourceforge.net/projects/foo/files/bar.zip").expect("url");

        assert_eq!(
            project_and_file(&url),
            Some(("foo".to_string(), "bar.zip".to_string()))
        );
    }

    #[test]
    fn non_file_urls_are_rejected() {
        let url = Url::parse("https://sourceforge.net/projects/foo/reviews").expect("url");
        assert_eq!(project_and_file(&url), None);
    }

    #[test]
    fn scrapes_mirror_ids() {
        let html = r#"
            <ul id="mirrorList">
                <li id="autoselect">Auto-select</li>
                <li id="psychz">Psychz Networks (Dallas, TX)</li>
                <li id="netcologne">NetCologne (Cologne, Germany)</li>
            </ul>
        "#;

        assert_eq!(parse_mirrors(html), vec!["psychz", "netcologne"]);
    }

    #[test]
    fn missing_mirror_list_means_no_mirrors() {
        assert!(parse_mirrors("<html><body>nothing here</body></html>").is_empty());
    }

    #[test]
    fn every_mirror_becomes_a_candidate() {
        let mirrors = vec!["psychz".to_string()];
        let urls = candidate_urls(&mirrors, "sevenzip", "7-Zip/23.01/7z2301.exe");

        assert_eq!(
            urls,
            vec![
                "https://psychz.dl.sourceforge.net/project/sevenzip/7-Zip/23.01/7z2301.exe",
                "https://downloads.sourceforge.net/project/sevenzip/7-Zip/23.01/7z2301.exe",
            ]
        );
    }
}
