//! Notification message bodies.
//!
//! Every failure class carries a header explaining what happened and, for
//! anything but a CI bug, who to contact. The bodies below embed that header
//! together with the component, branch and targets involved.

use crate::brew::BrewBuildAttempts;
use crate::config::PlatformCiConfig;
use crate::error::{ErrorClass, PciError, Result};
use std::fmt;
use std::path::Path;

pub const PLATFORM_CI_ADMINS: &str = "Platform CI administrators";

const HEADER_WIDTH: usize = 70;

pub fn header_title(class: ErrorClass) -> &'static str {
    match class {
        ErrorClass::Generic => {
            "An error has occurred and the desired action was not performed correctly. \
             Please contact the administrators of this CI instance."
        }
        ErrorClass::Contacts => "An error has occurred and no tests were reliably executed. ",
        ErrorClass::BrewBuild => "There was a problem during a Brew build attempt. ",
        ErrorClass::DistGit => "There was a problem with dist-git manipulation. ",
        ErrorClass::Jenkins => "An error has occurred while communicating with Jenkins. ",
    }
}

/// `title` followed by a call to action naming the administrators and the
/// bug destination, when configured.
pub fn platform_error_header(title: &str, config: &PlatformCiConfig) -> String {
    let admins = match &config.admins {
        Some(admins) => format!("{PLATFORM_CI_ADMINS} ({admins})"),
        None => PLATFORM_CI_ADMINS.to_string(),
    };
    let destination = match &config.bug_destination {
        Some(dest) => format!(" at {dest}"),
        None => String::new(),
    };
    format!("{title}Please contact {admins} or file a bug{destination}.")
}

/// Header for a failure of the given class. The generic header already
/// carries its own call to action.
pub fn error_header(class: ErrorClass, config: &PlatformCiConfig) -> String {
    match class {
        ErrorClass::Generic => header_title(class).to_string(),
        _ => platform_error_header(header_title(class), config),
    }
}

fn project_page(config: &PlatformCiConfig) -> String {
    match &config.project_url {
        Some(url) => format!("CI Project page: {url}"),
        None => String::new(),
    }
}

/// Greedy word wrap: lines never exceed `width` characters unless a single
/// word does.
pub(crate) fn wrap(text: &str, width: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();
    let mut line_chars = 0;
    for word in text.split_whitespace() {
        let word_chars = word.chars().count();
        if !line.is_empty() && line_chars + 1 + word_chars > width {
            lines.push(std::mem::take(&mut line));
            line_chars = 0;
        }
        if !line.is_empty() {
            line.push(' ');
            line_chars += 1;
        }
        line.push_str(word);
        line_chars += word_chars;
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines.join("\n")
}

// ---------------------------------------------------------------------------
// BrewBuildsErrorNotification
// ---------------------------------------------------------------------------

/// Body of the message sent when Brew builds could not be attempted at all.
#[derive(Debug, Clone)]
pub struct BrewBuildsErrorNotification {
    header: String,
    message: String,
    component: String,
    branch: String,
    targets: String,
    debug: String,
    project_page: String,
}

impl BrewBuildsErrorNotification {
    pub fn new(
        header: &str,
        message: impl Into<String>,
        component: impl Into<String>,
        branch: impl Into<String>,
        targets: &[String],
        config: &PlatformCiConfig,
    ) -> Self {
        Self {
            header: wrap(header, HEADER_WIDTH),
            message: message.into(),
            component: component.into(),
            branch: branch.into(),
            targets: targets.join(" "),
            debug: config.debug_log_url(),
            project_page: project_page(config),
        }
    }

    /// Notification for `error`, headed by its class.
    pub fn from_error(
        error: &PciError,
        component: impl Into<String>,
        branch: impl Into<String>,
        targets: &[String],
        config: &PlatformCiConfig,
    ) -> Self {
        let header = error_header(error.class(), config);
        Self::new(&header, error.to_string(), component, branch, targets, config)
    }
}

impl fmt::Display for BrewBuildsErrorNotification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.header)?;
        writeln!(f)?;
        writeln!(f, "Component:     {}", self.component)?;
        writeln!(f, "Branch:        {}", self.branch)?;
        writeln!(f, "Brew targets:  {}", self.targets)?;
        writeln!(f)?;
        writeln!(f, "Error message: {}", self.message)?;
        writeln!(f)?;
        writeln!(f, "Debug log: {}", self.debug)?;
        writeln!(f)?;
        writeln!(f, "--")?;
        writeln!(f, "{}", self.project_page)
    }
}

// ---------------------------------------------------------------------------
// IndividualBrewBuildResults
// ---------------------------------------------------------------------------

/// One `  <target> : <PASS|FAIL> (<url>)` line per finished build.
pub struct IndividualBrewBuildResults<'a> {
    builds: &'a BrewBuildAttempts,
    build_url: Option<&'a str>,
}

impl<'a> IndividualBrewBuildResults<'a> {
    pub fn new(builds: &'a BrewBuildAttempts, config: &'a PlatformCiConfig) -> Self {
        Self {
            builds,
            build_url: config.build_url.as_deref(),
        }
    }

    /// Builds must have been waited on.
    pub fn render(&self) -> Result<String> {
        let mut items = Vec::with_capacity(self.builds.all().len());
        for build in self.builds.all() {
            let url = match build.url()? {
                Some(url) => url,
                None => fallback_url(self.build_url, build.logfile_path()),
            };
            items.push(format!(
                "  {} : {} ({})",
                build.target(),
                build.short_result()?,
                url
            ));
        }
        Ok(items.join("\n"))
    }
}

/// Without a Brew task, point at the log archived as a Jenkins artifact.
fn fallback_url(build_url: Option<&str>, logfile: &Path) -> String {
    match (build_url, logfile.file_name()) {
        (Some(build_url), Some(name)) => {
            format!("{build_url}/artifact/{}", name.to_string_lossy())
        }
        _ => "No URL available".to_string(),
    }
}

// ---------------------------------------------------------------------------
// BrewBuildsNotification
// ---------------------------------------------------------------------------

/// Body of the message sent when every Brew request was issued and
/// processed, whatever the outcome of the builds themselves.
pub struct BrewBuildsNotification<'a> {
    builds: &'a BrewBuildAttempts,
    component: String,
    branch: String,
    config: &'a PlatformCiConfig,
}

impl<'a> BrewBuildsNotification<'a> {
    pub fn new(
        builds: &'a BrewBuildAttempts,
        component: impl Into<String>,
        branch: impl Into<String>,
        config: &'a PlatformCiConfig,
    ) -> Self {
        Self {
            builds,
            component: component.into(),
            branch: branch.into(),
            config,
        }
    }

    pub fn final_result(&self) -> Result<String> {
        if self.builds.all_successful()? {
            Ok("PASS".to_string())
        } else {
            Ok(format!("FAIL ({} builds failed)", self.builds.count_failed()?))
        }
    }

    pub fn render(&self) -> Result<String> {
        let individual = IndividualBrewBuildResults::new(self.builds, self.config).render()?;
        Ok(format!(
            "\n\
             Component:     {component}\n\
             Branch:        {branch}\n\
             Brew targets:  {targets}\n\
             \n\
             Final result:  {final_result}\n\
             \n\
             Individual results:\n\
             {individual}\n\
             \n\
             Debug log:      {debug}\n\
             \n\
             --\n\
             {project_page}\n",
            component = self.component,
            branch = self.branch,
            targets = self.builds.targets().join(" "),
            final_result = self.final_result()?,
            debug = self.config.debug_log_url(),
            project_page = project_page(self.config),
        ))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ENV_ADMINS, ENV_BUG_DESTINATION, ENV_BUILD_URL, ENV_PROJECT};

    fn full_config() -> PlatformCiConfig {
        PlatformCiConfig::from_vars([
            (ENV_ADMINS, "ci@example.com"),
            (ENV_BUG_DESTINATION, "https://bugs.example.com"),
            (ENV_BUILD_URL, "https://jenkins/job/ci-glibc/7"),
            (ENV_PROJECT, "https://ci.example.com"),
        ])
    }

    #[test]
    fn call_to_action_without_config() {
        let header = platform_error_header("Oops. ", &PlatformCiConfig::default());
        assert_eq!(header, "Oops. Please contact Platform CI administrators or file a bug.");
    }

    #[test]
    fn call_to_action_with_config() {
        let header = error_header(ErrorClass::Jenkins, &full_config());
        assert_eq!(
            header,
            "An error has occurred while communicating with Jenkins. Please contact \
             Platform CI administrators (ci@example.com) or file a bug at \
             https://bugs.example.com."
        );
    }

    #[test]
    fn generic_header_has_no_extra_call_to_action() {
        let header = error_header(ErrorClass::Generic, &full_config());
        assert_eq!(header, header_title(ErrorClass::Generic));
        assert!(!header.contains("file a bug"));
    }

    #[test]
    fn wrap_breaks_at_width() {
        let text = "aaaa bbbb cccc dddd";
        assert_eq!(wrap(text, 9), "aaaa bbbb\ncccc dddd");
        assert_eq!(wrap("averyveryverylongword x", 5), "averyveryverylongword\nx");
        assert_eq!(wrap("", 10), "");
    }

    #[test]
    fn wrap_counts_characters() {
        assert_eq!(wrap("Łukasz Řehák", 12), "Łukasz Řehák");
        let header = platform_error_header(
            header_title(ErrorClass::Jenkins),
            &PlatformCiConfig::from_vars([(ENV_ADMINS, "Jiří Šťastný, Zdeněk Žák")]),
        );
        for line in wrap(&header, HEADER_WIDTH).lines() {
            assert!(line.chars().count() <= HEADER_WIDTH, "{line}");
        }
        assert_eq!(
            wrap("ééééé ééééé", 11),
            "ééééé ééééé",
            "multi-byte words fit by character count"
        );
    }

    #[test]
    fn error_notification_body() {
        let config = full_config();
        let error = PciError::Brew("rhpkg exploded".to_string());
        let body = BrewBuildsErrorNotification::from_error(
            &error,
            "glibc",
            "rhel-7.3-staging",
            &["rhel-7.3-candidate".to_string(), "extras".to_string()],
            &config,
        )
        .to_string();

        assert!(body.starts_with("There was a problem during a Brew build attempt."));
        assert!(body.lines().all(|l| l.len() <= 70));
        assert!(body.contains("\nComponent:     glibc\n"));
        assert!(body.contains("\nBranch:        rhel-7.3-staging\n"));
        assert!(body.contains("\nBrew targets:  rhel-7.3-candidate extras\n"));
        assert!(body.contains("\nError message: rhpkg exploded\n"));
        assert!(body.contains("\nDebug log: https://jenkins/job/ci-glibc/7/console\n"));
        assert!(body.ends_with("--\nCI Project page: https://ci.example.com\n"));
    }

    #[test]
    fn error_notification_without_environment() {
        let config = PlatformCiConfig::default();
        let body =
            BrewBuildsErrorNotification::new("Header", "msg", "glibc", "b", &[], &config).to_string();
        assert!(body.contains("Debug log: unknown\n"));
        assert!(body.ends_with("--\n\n"));
    }

    #[test]
    fn fallback_urls() {
        let log = Path::new("/logs/build-extras.log");
        assert_eq!(
            fallback_url(Some("https://jenkins/job/x/1"), log),
            "https://jenkins/job/x/1/artifact/build-extras.log"
        );
        assert_eq!(fallback_url(None, log), "No URL available");
    }

    #[cfg(unix)]
    #[test]
    fn builds_notification_reports_failures() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut builds = BrewBuildAttempts::with_program(
            vec!["rhel-7.3-candidate".to_string(), "extras".to_string()],
            dir.path(),
            "false",
        );
        builds.execute().unwrap();
        builds.wait().unwrap();

        let config = PlatformCiConfig::from_vars([(ENV_BUILD_URL, "https://jenkins/job/w/3")]);
        let body = BrewBuildsNotification::new(&builds, "glibc", "rhel-7.3-staging", &config)
            .render()
            .unwrap();

        assert!(body.contains("Final result:  FAIL (2 builds failed)\n"));
        assert!(body.contains(
            "  rhel-7.3-candidate : FAIL (https://jenkins/job/w/3/artifact/build-rhel-7.3-candidate.log)\n"
        ));
        assert!(body.contains("  extras : FAIL (https://jenkins/job/w/3/artifact/build-extras.log)"));
        assert!(body.contains("Brew targets:  rhel-7.3-candidate extras\n"));
        assert!(body.contains("Debug log:      https://jenkins/job/w/3/console\n"));
    }

    #[cfg(unix)]
    #[test]
    fn builds_notification_pass_uses_task_url() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut builds =
            BrewBuildAttempts::with_program(vec!["extras".to_string()], dir.path(), "true");
        builds.execute().unwrap();
        builds.wait().unwrap();
        std::fs::write(
            dir.path().join("build-extras.log"),
            "Task info: https://brew/taskinfo?taskID=1\n",
        )
        .unwrap();

        let config = PlatformCiConfig::default();
        let notification = BrewBuildsNotification::new(&builds, "glibc", "private-x", &config);
        assert_eq!(notification.final_result().unwrap(), "PASS");
        let body = notification.render().unwrap();
        assert!(body.contains("  extras : PASS (https://brew/taskinfo?taskID=1)\n"));
    }
}
