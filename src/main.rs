use clap::{Parser, Subcommand};
use share_gallery::acl::{self, Permission, SubjectKind};
use share_gallery::cache::ThumbnailCache;
use share_gallery::config;
use share_gallery::entities::{File, Folder, Gallery, Photo};
use share_gallery::output;
use share_gallery::principal::User;
use std::path::{Path, PathBuf};

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "share-gallery")]
#[command(about = "Shared-storage photo gallery with per-share access control")]
#[command(long_about = "\
Shared-storage photo gallery with per-share access control

The data root is a plain directory tree. Each top-level folder is a share
with its own ACL; everything below it inherits the share's rules.

  data/
  ├── .shares.json                 # Share records: description + ACL text
  ├── holiday/                     # Share \"holiday\"
  │   ├── beach.jpg
  │   └── 2013/
  │       └── dunes.png
  └── work/                        # Share \"work\" (virtual until saved)

ACL text is a comma-separated list of kind:name:codes entries:

  user:alice:rwx,group:family:r,other::r

  r = read, w = write, x = manage. Superusers bypass ACLs.

Thumbnails are cached under cache/{width}/{path} and never regenerated.

Run 'share-gallery gen-config' to generate a documented gallery.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Gallery config file (defaults are used if it does not exist)
    #[arg(long, default_value = "gallery.toml", global = true)]
    config: PathBuf,

    /// Log cache and share activity to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// Who a command acts as.
#[derive(clap::Args, Clone)]
struct PrincipalArgs {
    /// User name (anonymous if omitted)
    #[arg(long)]
    user: Option<String>,

    /// Group the user belongs to (repeatable)
    #[arg(long = "group")]
    groups: Vec<String>,

    /// Act as a superuser, bypassing ACLs
    #[arg(long)]
    superuser: bool,
}

impl PrincipalArgs {
    fn to_user(&self) -> User {
        let user = match &self.user {
            Some(name) => User::new(name.as_str()),
            None => User::anonymous(),
        };
        User {
            superuser: self.superuser,
            ..user.with_groups(self.groups.iter().cloned())
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// List a folder's subfolders, photos and files
    Ls {
        /// Logical path; the root if omitted
        #[arg(default_value = "")]
        path: String,
        #[command(flatten)]
        principal: PrincipalArgs,
    },
    /// Check whether a principal has a permission on a path
    Check {
        path: String,
        /// read, write or manage (or r, w, x)
        permission: Permission,
        #[command(flatten)]
        principal: PrincipalArgs,
    },
    /// Create a folder (its parent must exist)
    Mkdir { path: String },
    /// Inspect and edit share ACLs
    Acl {
        #[command(subcommand)]
        command: AclCommand,
    },
    /// Print the cache URL of a photo's thumbnail, generating it if needed
    Thumb {
        path: String,
        /// Target width; the thumbnail fits in width x width*3/4
        width: u32,
        #[command(flatten)]
        principal: PrincipalArgs,
    },
    /// Pre-generate the configured thumbnail sizes for every photo in a folder
    Warm {
        /// Logical path; the root if omitted
        #[arg(default_value = "")]
        path: String,
    },
    /// Print a stock gallery.toml with all options documented
    GenConfig,
}

#[derive(Subcommand)]
enum AclCommand {
    /// Show a share's description and ACL entries
    Show { share: String },
    /// Grant a permission, reusing the subject's entry if it has one
    Grant {
        share: String,
        /// user, group or other
        kind: SubjectKind,
        /// User or group name (ignored for other)
        name: String,
        permission: Permission,
    },
    /// Replace a share's ACLs with stored-format text
    Set { share: String, acls: String },
    /// Set a share's description
    Describe { share: String, description: String },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Ls { path, principal } => {
            let gallery = open_gallery(&cli.config)?;
            let user = principal.to_user();
            let folder = Folder::open(&gallery, &path)?;
            require_read(folder.has_permission(Permission::Read, &user)?, folder.path(), &user)?;
            let contents = folder.contents()?;
            output::print_contents(&folder, gallery.config().title(), &contents);
        }
        Command::Check {
            path,
            permission,
            principal,
        } => {
            let gallery = open_gallery(&cli.config)?;
            let user = principal.to_user();
            let entry = File::open(&gallery, &path)?;
            let allowed = entry.has_permission(permission, &user)?;
            println!("{}", output::format_check(entry.path(), permission, &user, allowed));
        }
        Command::Mkdir { path } => {
            let gallery = open_gallery(&cli.config)?;
            let folder = Folder::create(&gallery, &path)?;
            println!("{}", folder.filepath().display());
        }
        Command::Acl { command } => {
            let gallery = open_gallery(&cli.config)?;
            run_acl(&gallery, command)?;
        }
        Command::Thumb {
            path,
            width,
            principal,
        } => {
            let gallery = open_gallery(&cli.config)?;
            let user = principal.to_user();
            let photo = Photo::open(&gallery, &path)?;
            require_read(photo.has_permission(Permission::Read, &user)?, photo.path(), &user)?;
            let cache = ThumbnailCache::new(gallery.config());
            println!("{}", photo.thumbnail(&cache, width)?);
        }
        Command::Warm { path } => {
            let gallery = open_gallery(&cli.config)?;
            init_thread_pool(&gallery.config().processing);
            let folder = Folder::open(&gallery, &path)?;
            let cache = ThumbnailCache::new(gallery.config());
            let sizes = &gallery.config().thumbnails.sizes;
            let stats = cache.warm(&folder, sizes)?;
            println!("{}", output::format_warm(&folder, sizes, &stats));
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load the config file and open the gallery it describes.
fn open_gallery(path: &Path) -> Result<Gallery, config::ConfigError> {
    let gallery_config = config::load_config(path)?;
    tracing::debug!(
        data_root = %gallery_config.data_root.display(),
        cache_root = %gallery_config.cache_root.display(),
        "loaded config"
    );
    Ok(Gallery::from_config(gallery_config))
}

fn run_acl(gallery: &Gallery, command: AclCommand) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        AclCommand::Show { share } => {
            output::print_share(&gallery.share(&share)?)?;
        }
        AclCommand::Grant {
            share,
            kind,
            name,
            permission,
        } => {
            let mut share = gallery.share(&share)?;
            share.grant(kind, &name, permission)?;
            share.save(gallery.share_store())?;
            output::print_share(&share)?;
        }
        AclCommand::Set { share, acls } => {
            let entries = acl::decode_list(&acls)?;
            let mut share = gallery.share(&share)?;
            share.set_acls(&entries);
            share.save(gallery.share_store())?;
            output::print_share(&share)?;
        }
        AclCommand::Describe { share, description } => {
            let mut share = gallery.share(&share)?;
            share.set_description(description);
            share.save(gallery.share_store())?;
            output::print_share(&share)?;
        }
    }
    Ok(())
}

/// Turn a denied read into an error naming who was refused.
fn require_read(allowed: bool, path: &str, user: &User) -> Result<(), Box<dyn std::error::Error>> {
    if allowed {
        Ok(())
    } else {
        Err(output::format_check(path, Permission::Read, user, false).into())
    }
}

/// Install the tracing subscriber. `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "share_gallery=debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores: the user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
