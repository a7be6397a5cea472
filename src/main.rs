use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lectern::hub::{self, HubClientBuilder};
use lectern::{CatalogEntry, Library, LibraryDetails, LibraryVersionKey, Registry, RegistryError};

/// lectern - versioned library registry CLI
#[derive(Parser)]
#[command(name = "lectern")]
#[command(about = "A registry for versioned interactive-content libraries")]
#[command(version)]
struct Cli {
    /// Path to the registry database (defaults to the per-user data directory)
    #[arg(long, value_name = "FILE", global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// List installed libraries grouped by machine name
    List,
    /// Show one library version with its dependencies and languages
    Show(VersionArgs),
    /// Delete a library version
    Delete(VersionArgs),
    /// Work with the content-type hub catalog
    Hub(HubCommand),
}

/// A library version addressed on the command line
#[derive(Parser)]
struct VersionArgs {
    /// Machine name, e.g. H5P.Accordion
    #[arg(value_name = "MACHINE_NAME")]
    machine_name: String,

    /// Major version
    #[arg(value_name = "MAJOR")]
    major: u32,

    /// Minor version
    #[arg(value_name = "MINOR")]
    minor: u32,
}

impl VersionArgs {
    fn key(&self) -> LibraryVersionKey {
        LibraryVersionKey::new(&self.machine_name, self.major, self.minor)
    }
}

#[derive(Parser)]
struct HubCommand {
    #[command(subcommand)]
    command: HubCommands,
}

#[derive(Subcommand)]
enum HubCommands {
    /// Fetch the hub catalog and replace the local mirror
    Refresh,
    /// List the mirrored hub catalog
    List,
}

fn main() {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::List => handle_list(&cli),
        Commands::Show(args) => handle_show(&cli, args),
        Commands::Delete(args) => handle_delete(&cli, args),
        Commands::Hub(hub_command) => match &hub_command.command {
            HubCommands::Refresh => handle_hub_refresh(&cli),
            HubCommands::List => handle_hub_list(&cli),
        },
    };

    if let Err(e) = result {
        // Determine exit code based on error type
        let exit_code = if is_user_error(&e) { 1 } else { 2 };
        eprintln!("Error: {e}");
        std::process::exit(exit_code);
    }
}

/// Determines if an error is a user error (vs internal error).
///
/// User errors are requests the registry understood and rejected:
/// unknown libraries, duplicate versions, constraint violations.
/// Internal errors include database, network and I/O failures.
fn is_user_error(error: &anyhow::Error) -> bool {
    matches!(
        error.downcast_ref::<RegistryError>(),
        Some(
            RegistryError::LibraryNotFound(_)
                | RegistryError::LibraryIdNotFound(_)
                | RegistryError::MachineNameNotFound(_)
                | RegistryError::DuplicateVersion(_)
                | RegistryError::UnresolvedDependency(_)
                | RegistryError::Constraint { .. }
        )
    )
}

fn handle_list(cli: &Cli) -> Result<()> {
    let registry = open_registry(cli)?;
    let groups = registry.libraries().list_all()?;
    print!("{}", render_library_list(&groups));
    Ok(())
}

fn handle_show(cli: &Cli, args: &VersionArgs) -> Result<()> {
    let registry = open_registry(cli)?;
    let key = args.key();
    let details = registry.libraries().load(&key)?;
    let languages = registry.libraries().language_codes(&key)?;
    print!("{}", render_details(&details, &languages));
    Ok(())
}

fn handle_delete(cli: &Cli, args: &VersionArgs) -> Result<()> {
    let registry = open_registry(cli)?;
    let key = args.key();
    let library = registry
        .libraries()
        .find_by_key(&key)?
        .ok_or(RegistryError::LibraryNotFound(key))?;

    registry.libraries().delete(library.id)?;
    println!("Deleted {}", library.key());
    Ok(())
}

fn handle_hub_refresh(cli: &Cli) -> Result<()> {
    let registry = open_registry(cli)?;
    let client = HubClientBuilder::new()
        .build()
        .context("Failed to create hub client")?;

    let installed = hub::refresh(&client, &registry.catalog())?;
    println!("Hub catalog refreshed: {installed} content types");
    Ok(())
}

fn handle_hub_list(cli: &Cli) -> Result<()> {
    let registry = open_registry(cli)?;
    let entries = registry.catalog().entries()?;
    print!("{}", render_catalog(&entries));
    Ok(())
}

/// Opens the registry over the selected database file, creating its
/// directory when needed.
fn open_registry(cli: &Cli) -> Result<Registry> {
    let db_path = match &cli.database {
        Some(path) => path.clone(),
        None => get_database_path()?,
    };
    ensure_database_directory(&db_path)?;

    Registry::builder()
        .database_path(&db_path)
        .build()
        .context("Failed to open registry database")
}

/// Gets the cross-platform database path.
///
/// Returns the path as `{data_dir}/lectern/registry.db` where `data_dir` is:
/// - Linux: `~/.local/share`
/// - macOS: `~/Library/Application Support`
/// - Windows: `C:\Users\<user>\AppData\Roaming`
fn get_database_path() -> Result<PathBuf> {
    let data_dir =
        dirs::data_dir().ok_or_else(|| anyhow::anyhow!("Failed to determine data directory"))?;

    Ok(data_dir.join("lectern").join("registry.db"))
}

/// Ensures the parent directory of the database file exists.
fn ensure_database_directory(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create database directory: {}", parent.display())
        })?;
    }
    Ok(())
}

fn render_library_list(groups: &[(String, Vec<Library>)]) -> String {
    if groups.is_empty() {
        return "No libraries installed.\n".to_string();
    }

    let mut out = String::new();
    for (machine_name, versions) in groups {
        out.push_str(machine_name);
        out.push('\n');
        for library in versions {
            out.push_str(&format!(
                "  {} {}.{}.{}{}\n",
                library.title,
                library.major_version,
                library.minor_version,
                library.patch_version,
                if library.runnable { " (runnable)" } else { "" },
            ));
        }
    }
    out
}

fn render_details(details: &LibraryDetails, languages: &[String]) -> String {
    let library = &details.library;
    let mut out = format!(
        "{} {}.{} (patch {})\nTitle: {}\nRunnable: {}\n",
        library.machine_name,
        library.major_version,
        library.minor_version,
        library.patch_version,
        library.title,
        if library.runnable { "yes" } else { "no" },
    );

    if !library.embed_types.is_empty() {
        out.push_str(&format!("Embed types: {}\n", library.embed_types.join(", ")));
    }
    if !library.preloaded_js.is_empty() {
        out.push_str(&format!("Preloaded JS: {}\n", library.preloaded_js.join(", ")));
    }
    if !library.preloaded_css.is_empty() {
        out.push_str(&format!("Preloaded CSS: {}\n", library.preloaded_css.join(", ")));
    }

    let dependencies = &details.dependencies;
    for (label, keys) in [
        ("Preloaded dependencies", &dependencies.preloaded),
        ("Dynamic dependencies", &dependencies.dynamic),
        ("Editor dependencies", &dependencies.editor),
    ] {
        if !keys.is_empty() {
            let names: Vec<String> = keys.iter().map(|key| key.to_string()).collect();
            out.push_str(&format!("{}: {}\n", label, names.join(", ")));
        }
    }

    if !languages.is_empty() {
        out.push_str(&format!("Languages: {}\n", languages.join(", ")));
    }

    out
}

fn render_catalog(entries: &[CatalogEntry]) -> String {
    if entries.is_empty() {
        return "Hub catalog is empty. Run `lectern hub refresh` first.\n".to_string();
    }

    let mut out = String::new();
    for entry in entries {
        out.push_str(&format!(
            "{} {}.{}.{}  {}{}\n",
            entry.machine_name,
            entry.major_version,
            entry.minor_version,
            entry.patch_version,
            entry.title,
            if entry.is_recommended {
                " (recommended)"
            } else {
                ""
            },
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectern::{DependencySet, DependencyType, LibraryId};

    fn library(machine_name: &str, title: &str, minor: u32, runnable: bool) -> Library {
        Library {
            id: LibraryId::new(1),
            machine_name: machine_name.to_string(),
            title: title.to_string(),
            major_version: 1,
            minor_version: minor,
            patch_version: 2,
            runnable,
            fullscreen: false,
            embed_types: vec!["div".to_string()],
            preloaded_js: vec!["js/main.js".to_string()],
            preloaded_css: vec![],
            drop_library_css: vec![],
            semantics: None,
            has_icon: false,
            tutorial_url: None,
        }
    }

    #[test]
    fn render_library_list_groups_and_marks_runnable() {
        let groups = vec![(
            "H5P.Accordion".to_string(),
            vec![
                library("H5P.Accordion", "Accordion", 4, true),
                library("H5P.Accordion", "Accordion", 5, false),
            ],
        )];

        let rendered = render_library_list(&groups);
        assert_eq!(
            rendered,
            "H5P.Accordion\n  Accordion 1.4.2 (runnable)\n  Accordion 1.5.2\n"
        );
    }

    #[test]
    fn render_library_list_reports_an_empty_registry() {
        assert_eq!(render_library_list(&[]), "No libraries installed.\n");
    }

    #[test]
    fn render_details_includes_dependencies_and_languages() {
        let mut dependencies = DependencySet::new();
        dependencies.push(
            DependencyType::Preloaded,
            LibraryVersionKey::new("H5P.Text", 1, 1),
        );
        let details = LibraryDetails {
            library: library("H5P.Accordion", "Accordion", 4, true),
            dependencies,
        };

        let rendered = render_details(&details, &["en".to_string(), "nb".to_string()]);

        assert!(rendered.starts_with("H5P.Accordion 1.4 (patch 2)\n"));
        assert!(rendered.contains("Preloaded dependencies: H5P.Text 1.1\n"));
        assert!(!rendered.contains("Dynamic dependencies"));
        assert!(rendered.contains("Languages: en, nb\n"));
    }

    #[test]
    fn render_catalog_marks_recommended_entries() {
        let mut entry = CatalogEntry {
            machine_name: "H5P.Accordion".to_string(),
            major_version: 1,
            minor_version: 0,
            patch_version: 33,
            core_major: 1,
            core_minor: 24,
            title: "Accordion".to_string(),
            summary: String::new(),
            description: String::new(),
            icon_url: String::new(),
            created_at: 0,
            updated_at: 0,
            is_recommended: true,
            popularity: 0,
            screenshots: "[]".to_string(),
            license: "[]".to_string(),
            keywords: "[]".to_string(),
            categories: "[]".to_string(),
            example_url: String::new(),
            tutorial_url: String::new(),
            owner: String::new(),
        };

        let rendered = render_catalog(std::slice::from_ref(&entry));
        assert_eq!(rendered, "H5P.Accordion 1.0.33  Accordion (recommended)\n");

        entry.is_recommended = false;
        let rendered = render_catalog(std::slice::from_ref(&entry));
        assert_eq!(rendered, "H5P.Accordion 1.0.33  Accordion\n");
    }

    #[test]
    fn render_catalog_reports_an_empty_mirror() {
        assert_eq!(
            render_catalog(&[]),
            "Hub catalog is empty. Run `lectern hub refresh` first.\n"
        );
    }

    #[test]
    fn user_errors_are_distinguished_from_internal_ones() {
        let not_found = anyhow::Error::new(RegistryError::LibraryNotFound(
            LibraryVersionKey::new("H5P.Missing", 1, 0),
        ));
        assert!(is_user_error(&not_found));

        let wrapped = not_found.context("while deleting");
        assert!(is_user_error(&wrapped));

        let internal = anyhow::anyhow!("disk on fire");
        assert!(!is_user_error(&internal));
    }
}
