//! Rendering of the pbuilder `KEY=VALUE` configuration file.

use std::borrow::Cow;

use crate::distribution::Distribution;

use super::BuildRoot;

/// Separator pbuilder uses between `OTHERMIRROR` source lines.
pub const OTHERMIRROR_SEPARATOR: &str = "|";

/// Rendered configuration entries, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PbuilderConfig {
    entries: Vec<(&'static str, String)>,
}

impl PbuilderConfig {
    pub fn for_root(root: &BuildRoot, distribution: &Distribution) -> Self {
        let path = |p: std::path::PathBuf| p.display().to_string();
        let entries = vec![
            ("BASETGZ", path(root.base_image_path())),
            ("APTCACHE", path(root.aptcache_dir())),
            ("BUILDRESULT", path(root.result_dir())),
            ("BUILDPLACE", path(root.build_dir())),
            ("HOOKDIR", path(root.hook_dir())),
            ("MIRRORSITE", distribution.mirror().to_string()),
            ("DISTRIBUTION", distribution.dist().to_string()),
            ("COMPONENTS", join_components(distribution.components())),
            ("OTHERMIRROR", join_extra(distribution.extra())),
        ];
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// One `KEY=VALUE` line per entry.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.entries {
            out.push_str(key);
            out.push('=');
            out.push_str(&quote_value(value));
            out.push('\n');
        }
        out
    }
}

/// Double-quotes values containing a space; everything else is written bare.
pub fn quote_value(value: &str) -> Cow<'_, str> {
    if value.contains(' ') {
        Cow::Owned(format!("\"{value}\""))
    } else {
        Cow::Borrowed(value)
    }
}

pub fn join_components(components: &[String]) -> String {
    components.join(" ")
}

/// Source lines are not escaped here; [`Distribution::validate`] rejects
/// lines containing the separator.
pub fn join_extra(extra: &[String]) -> String {
    extra.join(OTHERMIRROR_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn distribution(extra: Vec<String>) -> Distribution {
        Distribution::new(
            "lucid",
            "http://mirror.example/ubuntu/",
            "lucid",
            vec!["main".into(), "universe".into()],
            extra,
        )
        .unwrap()
    }

    #[test]
    fn joins_components_with_spaces() {
        assert_eq!(
            join_components(&["main".into(), "universe".into()]),
            "main universe"
        );
    }

    #[test]
    fn joins_extra_with_pipe() {
        assert_eq!(join_extra(&["A".into(), "B".into()]), "A|B");
        assert_eq!(join_extra(&[]), "");
    }

    #[test]
    fn quotes_only_values_with_spaces() {
        assert_eq!(quote_value("has space"), "\"has space\"");
        assert_eq!(quote_value("bare"), "bare");
        assert_eq!(quote_value(""), "");
    }

    #[test]
    fn renders_all_keys_with_absolute_paths() {
        let dist = distribution(vec![]);
        let root = BuildRoot::new(Path::new("/var/cache/pbuilder"), &dist).unwrap();
        let config = PbuilderConfig::for_root(&root, &dist);

        assert_eq!(config.get("BASETGZ"), Some("/var/cache/pbuilder/lucid/base.tgz"));
        assert_eq!(config.get("APTCACHE"), Some("/var/cache/pbuilder/lucid/aptcache"));
        assert_eq!(config.get("BUILDRESULT"), Some("/var/cache/pbuilder/lucid/result"));
        assert_eq!(config.get("BUILDPLACE"), Some("/var/cache/pbuilder/lucid/build"));
        assert_eq!(config.get("HOOKDIR"), Some("/var/cache/pbuilder/lucid/hook"));
        assert_eq!(config.get("MIRRORSITE"), Some("http://mirror.example/ubuntu/"));
        assert_eq!(config.get("DISTRIBUTION"), Some("lucid"));

        let rendered = config.render();
        assert!(rendered.contains("COMPONENTS=\"main universe\"\n"));
        assert!(rendered.contains("OTHERMIRROR=\n"));
        assert_eq!(rendered.lines().count(), 9);
        for line in rendered.lines() {
            assert!(line.contains('='), "{line}");
        }
    }

    #[test]
    fn renders_extra_repositories_quoted() {
        let dist = distribution(vec![
            "deb http://a.example/ lucid main".into(),
            "deb http://b.example/ lucid main".into(),
        ]);
        let root = BuildRoot::new(Path::new("/srv/pbuilder"), &dist).unwrap();
        let rendered = PbuilderConfig::for_root(&root, &dist).render();

        assert!(rendered.contains(
            "OTHERMIRROR=\"deb http://a.example/ lucid main|deb http://b.example/ lucid main\"\n"
        ));
    }
}
