mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "platform-ci",
    about = "Platform-CI: Jenkins job management and Build-on-Push dispatch for dist-git components",
    version,
    propagate_version = true
)]
struct Cli {
    /// Platform-CI checkout holding the Jenkins configuration and job templates
    #[arg(long, global = true, env = "PLATFORM_CI_HOME")]
    home: Option<PathBuf>,

    /// Jenkins instance to talk to
    #[arg(long, global = true, env = "JENKINS_URL")]
    jenkins_url: Option<String>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install Jenkins Job Builder and run it over the job definitions
    JenkinsJobs {
        /// `test` renders the jobs, `update` applies them to Jenkins
        mode: String,

        /// Use the jenkins-jobs already on PATH
        #[arg(long)]
        skip_install: bool,
    },

    /// Decide whether a pushed dist-git branch is built, and trigger its worker job
    Dispatch {
        component: String,
        /// Pushed branch, `origin/` prefix allowed
        git_branch: String,
        /// GitHub user or organization hosting the Platform-CI repository
        platform_ci_repo: String,
        /// Platform-CI branch the worker jobs run from
        platform_ci_branch: String,

        /// Jenkins slave label for the worker job
        #[arg(long, env = "NODE_NAME")]
        slave: String,

        /// Pushed commit
        #[arg(long, env = "GIT_COMMIT")]
        commit: Option<String>,

        /// Directory containing the component checkout
        #[arg(long, env = "WORKSPACE")]
        workspace: Option<PathBuf>,
    },

    /// Enable or disable Build-on-Push for a component
    Setup {
        component: String,
        /// `true` enables the dispatcher job, `false` disables it
        #[arg(action = clap::ArgAction::Set)]
        build_on_commit: bool,
        slave: String,
        platform_ci_repo: String,
        platform_ci_branch: String,
    },

    /// Delete the Build-on-Push dispatcher job of a component
    Teardown { component: String },

    /// Run Brew scratch builds of the checked-out branch (worker job)
    Build {
        component: String,
        git_branch: String,

        /// Brew targets, space separated
        #[arg(long, env = "BREW_TARGETS", value_delimiter = ' ')]
        targets: Vec<String>,

        /// Directory for the per-target build logs (default: cwd)
        #[arg(long)]
        logdir: Option<PathBuf>,

        /// Address of the pusher, remembered for every issued Brew task
        #[arg(long, env = "GIT_COMMITTER_EMAIL")]
        committer: Option<String>,

        /// Write the notification message here instead of stdout
        #[arg(long)]
        notification: Option<PathBuf>,
    },

    /// Classify dist-git branch names
    Branch {
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Create or update a Jenkins view
    View {
        name: String,

        /// View XML (default: jenkins/view-template.xml under the home)
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Inspect the configuration read from the environment
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    // Usage errors exit 1 like every other failure; --help and --version exit 0.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.exit_code() == 0 { 0 } else { 1 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let ctx = cmd::Context {
        home: cli.home,
        jenkins_url: cli.jenkins_url,
        json: cli.json,
    };

    let result = match cli.command {
        Commands::JenkinsJobs { mode, skip_install } => {
            cmd::jenkins_jobs::run(&ctx, &mode, skip_install)
        }
        Commands::Dispatch {
            component,
            git_branch,
            platform_ci_repo,
            platform_ci_branch,
            slave,
            commit,
            workspace,
        } => cmd::dispatch::run(
            &ctx,
            cmd::dispatch::DispatchArgs {
                component,
                git_branch,
                platform_ci_repo,
                platform_ci_branch,
                slave,
                commit,
                workspace: root::resolve_workspace(workspace.as_deref()),
            },
        ),
        Commands::Setup {
            component,
            build_on_commit,
            slave,
            platform_ci_repo,
            platform_ci_branch,
        } => cmd::setup::run(
            &ctx,
            &component,
            build_on_commit,
            &slave,
            &platform_ci_repo,
            &platform_ci_branch,
        ),
        Commands::Teardown { component } => cmd::setup::teardown(&ctx, &component),
        Commands::Build {
            component,
            git_branch,
            targets,
            logdir,
            committer,
            notification,
        } => cmd::build::run(
            &ctx,
            cmd::build::BuildArgs {
                component,
                git_branch,
                targets,
                logdir: root::resolve_workspace(logdir.as_deref()),
                committer,
                notification,
            },
        ),
        Commands::Branch { names } => cmd::branch::run(&names, ctx.json),
        Commands::View { name, file } => cmd::view::run(&ctx, &name, file.as_deref()),
        Commands::Config { subcommand } => cmd::config::run(&ctx, subcommand),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
