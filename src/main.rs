use anyhow::Result;
use clap::Parser;
use dslm::catalog::Bucket;
use dslm::commands;
use dslm::error::{DslmError, kind_of};
use std::path::PathBuf;
use std::process::ExitCode;

/// dslm - Drupal Site Link Manager
///
/// Keep Drupal cores, distributions and install profiles in one shared
/// directory (the "dslm base") and point sites at them with symlinks.
///
/// Examples:
///   dslm new mysite drupal-7.32 7.x-3.9   # Create a site
///   dslm switch-core --latest             # Move the current site to the latest core
#[derive(Parser, Debug)]
#[command(author, version = env!("DSLM_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Repository root holding cores/, dists/ and profiles/ (also via DSLM_BASE)
    #[arg(
        long = "base",
        short = 'b',
        env = "DSLM_BASE",
        value_name = "PATH",
        global = true
    )]
    pub base: Option<PathBuf>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// List the cores in the repository
    Cores(BucketArgs),

    /// List the distributions in the repository
    Dists(BucketArgs),

    /// List the install profiles in the repository
    Profiles(ProfilesArgs),

    /// Show the latest release core, distribution and profiles
    Latest,

    /// Show the core and distribution a site is linked to
    Info(DirArgs),

    /// Show every link of a site that points into the repository
    Links(DirArgs),

    /// Create a new site
    New(NewArgs),

    /// Switch a site to another core
    SwitchCore(SwitchArgs),

    /// Switch a site to another distribution
    SwitchDist(SwitchArgs),

    /// Link an install profile into a site
    LinkProfile(LinkProfileArgs),
}

#[derive(clap::Args, Debug)]
pub struct BucketArgs {
    /// Only release versions
    #[arg(long, conflicts_with = "dev")]
    pub release: bool,

    /// Only development versions (dev, alpha, beta, rc)
    #[arg(long)]
    pub dev: bool,
}

impl BucketArgs {
    fn bucket(&self) -> Bucket {
        if self.release {
            Bucket::Release
        } else if self.dev {
            Bucket::Dev
        } else {
            Bucket::All
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct ProfilesArgs {
    /// Only list versions of this profile
    #[arg(value_name = "NAME")]
    pub name: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct DirArgs {
    /// Site directory (defaults to the current directory)
    #[arg(value_name = "DIR")]
    pub dir: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Directory to create the site in
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,

    /// Core to link, e.g. drupal-7.32 (prompted when omitted)
    #[arg(value_name = "CORE")]
    pub core: Option<String>,

    /// Distribution to link, e.g. 7.x-3.9 (prompted when omitted)
    #[arg(value_name = "DIST")]
    pub dist: Option<String>,

    /// Reuse an existing directory
    #[arg(long, short)]
    pub force: bool,

    /// Use the latest release instead of prompting
    #[arg(long)]
    pub latest: bool,
}

#[derive(clap::Args, Debug)]
pub struct SwitchArgs {
    /// Version to link (prompted when omitted)
    #[arg(value_name = "VERSION")]
    pub version: Option<String>,

    /// Site directory (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Switch even if the directory is not a Drupal site
    #[arg(long, short)]
    pub force: bool,

    /// Use the latest release instead of prompting
    #[arg(long)]
    pub latest: bool,
}

#[derive(clap::Args, Debug)]
pub struct LinkProfileArgs {
    /// Profile name, e.g. openatrium
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Profile version, e.g. 7.x-2.0
    #[arg(value_name = "VERSION")]
    pub version: String,

    /// Site directory (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Replace an existing link to another version
    #[arg(long)]
    pub relink: bool,
}

fn run(cli: Cli) -> Result<()> {
    let runtime = dslm::runtime::RealRuntime;
    let base = cli.base;

    match cli.command {
        Commands::Cores(args) => commands::cores(runtime, base, args.bucket()),
        Commands::Dists(args) => commands::dists(runtime, base, args.bucket()),
        Commands::Profiles(args) => commands::profiles(runtime, base, args.name.as_deref()),
        Commands::Latest => commands::latest(runtime, base),
        Commands::Info(args) => commands::info(runtime, base, args.dir.as_deref()),
        Commands::Links(args) => commands::links(runtime, base, args.dir.as_deref()),
        Commands::New(args) => commands::new_site(
            runtime,
            base,
            &args.dir,
            args.core.as_deref(),
            args.dist.as_deref(),
            args.force,
            args.latest,
        ),
        Commands::SwitchCore(args) => commands::switch_core(
            runtime,
            base,
            args.version.as_deref(),
            args.dir.as_deref(),
            args.force,
            args.latest,
        ),
        Commands::SwitchDist(args) => commands::switch_dist(
            runtime,
            base,
            args.version.as_deref(),
            args.dir.as_deref(),
            args.force,
            args.latest,
        ),
        Commands::LinkProfile(args) => commands::link_profile(
            runtime,
            base,
            &args.name,
            &args.version,
            args.dir.as_deref(),
            args.relink,
        ),
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if matches!(kind_of(&e), Some(DslmError::Cancelled)) => {
            eprintln!("Cancelled.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
