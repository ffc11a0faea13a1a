// Shop Track CLI binary

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use shop_track_lib::auth::{AuthProvider, KeychainAuthProvider};
use shop_track_lib::commands::{diagnostics, listing, vehicles};
use shop_track_lib::constants::PAGE_SIZE_SETTING;
use shop_track_lib::list::ListViewModel;
use shop_track_lib::model::{ImageRef, PartRecord, VehicleRecord};
use shop_track_lib::{store, AppState};

#[derive(Parser)]
#[command(name = "shoptrack")]
#[command(about = "Shop Track - vehicle & parts intake tracking for repair shops", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a store
    Init {
        /// Store root path (defaults to the home directory)
        #[arg(short, long)]
        root: Option<PathBuf>,
    },

    /// Register a staff account in the OS keychain
    Register {
        /// Account email
        email: String,
        /// Account password (min 6 characters)
        #[arg(long)]
        password: String,
    },

    /// Sign in with a registered account
    Login {
        /// Account email
        email: String,
        /// Account password
        #[arg(long)]
        password: String,
    },

    /// Add a vehicle with its parts
    Add {
        /// License plate
        plate: String,
        /// Vehicle brand
        #[arg(long)]
        brand: String,
        /// Owner name
        #[arg(long)]
        owner: String,
        /// Part entry: "name|status[|image path[|intake date]]" (repeatable)
        #[arg(long = "part")]
        parts: Vec<String>,
        /// Store root path (defaults to the home directory)
        #[arg(short, long)]
        root: Option<PathBuf>,
    },

    /// Edit an existing vehicle
    Edit {
        /// Record id
        id: String,
        /// Replace the license plate
        #[arg(long)]
        plate: Option<String>,
        /// Replace the brand
        #[arg(long)]
        brand: Option<String>,
        /// Replace the owner name
        #[arg(long)]
        owner: Option<String>,
        /// Append a part: "name|status[|image path[|intake date]]" (repeatable)
        #[arg(long = "add-part")]
        add_parts: Vec<String>,
        /// Remove the part at this index (repeatable)
        #[arg(long = "remove-part")]
        remove_parts: Vec<usize>,
        /// Store root path (defaults to the home directory)
        #[arg(short, long)]
        root: Option<PathBuf>,
    },

    /// List vehicles with search and paging
    List {
        /// Filter by plate or brand substring
        #[arg(short, long)]
        search: Option<String>,
        /// Page to show (1-based)
        #[arg(long, default_value = "1")]
        page: usize,
        /// Override the configured page size
        #[arg(long)]
        page_size: Option<usize>,
        /// Store root path (defaults to the home directory)
        #[arg(short, long)]
        root: Option<PathBuf>,
    },

    /// Show one vehicle in full
    Show {
        /// Record id
        id: String,
        /// Store root path (defaults to the home directory)
        #[arg(short, long)]
        root: Option<PathBuf>,
    },

    /// Delete a vehicle record
    Delete {
        /// Record id
        id: String,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
        /// Store root path (defaults to the home directory)
        #[arg(short, long)]
        root: Option<PathBuf>,
    },

    /// Get or set store configuration
    Config {
        /// Set the list page size
        #[arg(long)]
        page_size: Option<usize>,
        /// Store root path (defaults to the home directory)
        #[arg(short, long)]
        root: Option<PathBuf>,
    },

    /// List uploaded part photos that no record references
    Orphans {
        /// Store root path (defaults to the home directory)
        #[arg(short, long)]
        root: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Init { root } => cmd_init(root),
        Commands::Register { email, password } => cmd_register(email, password),
        Commands::Login { email, password } => cmd_login(email, password),
        Commands::Add {
            plate,
            brand,
            owner,
            parts,
            root,
        } => cmd_add(plate, brand, owner, parts, root),
        Commands::Edit {
            id,
            plate,
            brand,
            owner,
            add_parts,
            remove_parts,
            root,
        } => cmd_edit(id, plate, brand, owner, add_parts, remove_parts, root),
        Commands::List {
            search,
            page,
            page_size,
            root,
        } => cmd_list(search, page, page_size, root),
        Commands::Show { id, root } => cmd_show(id, root),
        Commands::Delete { id, yes, root } => cmd_delete(id, yes, root),
        Commands::Config { page_size, root } => cmd_config(page_size, root),
        Commands::Orphans { root } => cmd_orphans(root),
    }
}

fn resolve_root(root: Option<PathBuf>) -> Result<PathBuf> {
    match root {
        Some(path) => Ok(path),
        None => store::default_root(),
    }
}

/// Parse "name|status[|image path[|intake date]]" into a part entry.
fn parse_part(entry: &str) -> Result<PartRecord> {
    let mut fields = entry.splitn(4, '|');
    let name = fields.next().unwrap_or("").trim().to_string();
    let status = fields.next().unwrap_or("").trim().to_string();
    if name.is_empty() || status.is_empty() {
        anyhow::bail!("Part needs at least \"name|status\": {}", entry);
    }

    let image_ref = fields
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ImageRef::pending);
    let intake_date = fields
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Ok(PartRecord {
        name,
        status,
        image_ref,
        intake_date,
    })
}

fn cmd_init(root: Option<PathBuf>) -> Result<()> {
    let root = resolve_root(root)?;
    store::init_store(&root)?;
    println!("Initialized store at {}", store::get_shoptrack_path(&root).display());
    Ok(())
}

fn cmd_register(email: String, password: String) -> Result<()> {
    KeychainAuthProvider.register(&email, &password)?;
    println!("Registered {}", email);
    Ok(())
}

fn cmd_login(email: String, password: String) -> Result<()> {
    match KeychainAuthProvider.login(&email, &password) {
        Ok(session) => {
            println!("Signed in as {}", session.email);
            Ok(())
        }
        Err(e) => {
            // One generic message, regardless of which credential was wrong
            println!("{}", e);
            std::process::exit(1);
        }
    }
}

fn cmd_add(
    plate: String,
    brand: String,
    owner: String,
    parts: Vec<String>,
    root: Option<PathBuf>,
) -> Result<()> {
    let root = resolve_root(root)?;
    let mut state = AppState::open(&root)?;

    state.form.plate = plate;
    state.form.brand = brand;
    state.form.owner_name = owner;
    for entry in &parts {
        *state.form.add_part() = parse_part(entry)?;
    }

    let id = vehicles::submit(&mut state)?;
    println!("Saved vehicle {}", id);
    Ok(())
}

fn cmd_edit(
    id: String,
    plate: Option<String>,
    brand: Option<String>,
    owner: Option<String>,
    add_parts: Vec<String>,
    remove_parts: Vec<usize>,
    root: Option<PathBuf>,
) -> Result<()> {
    let root = resolve_root(root)?;
    let mut state = AppState::open(&root)?;

    vehicles::edit(&mut state, &id)?;

    if let Some(plate) = plate {
        state.form.plate = plate;
    }
    if let Some(brand) = brand {
        state.form.brand = brand;
    }
    if let Some(owner) = owner {
        state.form.owner_name = owner;
    }

    // Remove from the highest index down so earlier removals don't shift
    // the later ones
    let mut remove_parts = remove_parts;
    remove_parts.sort_unstable_by(|a, b| b.cmp(a));
    for index in remove_parts {
        vehicles::remove_part(&mut state, index)?;
    }
    for entry in &add_parts {
        *state.form.add_part() = parse_part(entry)?;
    }

    vehicles::submit(&mut state)?;
    println!("Updated vehicle {}", id);
    Ok(())
}

fn cmd_list(
    search: Option<String>,
    page: usize,
    page_size: Option<usize>,
    root: Option<PathBuf>,
) -> Result<()> {
    let root = resolve_root(root)?;
    let mut state = AppState::open(&root)?;

    if let Some(size) = page_size {
        state.list = ListViewModel::attach(&state.repo, size)?;
    }
    if let Some(term) = &search {
        listing::search_changed(&mut state, term);
    }
    for _ in 1..page.max(1) {
        listing::next_page(&mut state);
    }

    let items = listing::refresh(&mut state);
    if items.is_empty() {
        println!("No vehicles to show.");
    } else {
        println!("{:<10} {:<12} {:<20} {:>5}  {}", "PLATE", "BRAND", "OWNER", "PARTS", "ID");
        for record in &items {
            print_row(record);
        }
    }
    println!(
        "Page {} of {} ({} matching)",
        state.list.current_page(),
        state.list.total_pages(),
        state.list.filtered().len()
    );
    Ok(())
}

fn print_row(record: &VehicleRecord) {
    println!(
        "{:<10} {:<12} {:<20} {:>5}  {}",
        record.plate,
        record.brand,
        record.owner_name,
        record.parts.len(),
        record.id.as_deref().unwrap_or("-")
    );
}

fn cmd_show(id: String, root: Option<PathBuf>) -> Result<()> {
    let root = resolve_root(root)?;
    let state = AppState::open(&root)?;

    let record = state
        .repo
        .get(&id)?
        .ok_or_else(|| anyhow::anyhow!("No vehicle with id {}", id))?;

    println!("Plate: {}", record.plate);
    println!("Brand: {}", record.brand);
    println!("Owner: {}", record.owner_name);
    println!("Parts ({}):", record.parts.len());
    for (index, part) in record.parts.iter().enumerate() {
        let image = match &part.image_ref {
            Some(image) => image.as_url().unwrap_or("(pending upload)"),
            None => "-",
        };
        let date = part.intake_date.as_deref().unwrap_or("-");
        println!("  [{}] {}: {} (intake {}, photo {})", index, part.name, part.status, date, image);
    }
    Ok(())
}

fn cmd_delete(id: String, yes: bool, root: Option<PathBuf>) -> Result<()> {
    let root = resolve_root(root)?;
    let mut state = AppState::open(&root)?;

    if listing::delete(&mut state, &id, yes)? {
        println!("Deleted vehicle {}", id);
    } else {
        println!("Not deleted. Re-run with --yes to confirm.");
    }
    Ok(())
}

fn cmd_config(page_size: Option<usize>, root: Option<PathBuf>) -> Result<()> {
    let root = resolve_root(root)?;
    let state = AppState::open(&root)?;

    match page_size {
        Some(size) if size > 0 => {
            state
                .repo
                .store()
                .set_setting(PAGE_SIZE_SETTING, &size.to_string())?;
            println!("List page size set to {}", size);
        }
        Some(_) => anyhow::bail!("Page size must be at least 1"),
        None => println!("List page size: {}", state.list.page_size()),
    }
    Ok(())
}

fn cmd_orphans(root: Option<PathBuf>) -> Result<()> {
    let root = resolve_root(root)?;
    let state = AppState::open(&root)?;

    let orphans = diagnostics::orphan_blobs(&state)?;
    if orphans.is_empty() {
        println!("No orphaned uploads.");
    } else {
        println!("{} orphaned upload(s):", orphans.len());
        for key in orphans {
            println!("  {}", key);
        }
    }
    Ok(())
}
