use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use occupancy_core::stats::occupied_beds;
use occupancy_core::{
    average_waiting_days, build_window, municipality_rows, municipality_stats, organisation_stats,
    parse_day, process_waiting_list, rank_suggestions_where, rank_vacancies, Municipality,
    OccupancyConfig, PatientStay, Room, WaitingListEntry, WindowMode,
};
use occupancy_store::{
    parse_config_str, parse_stays_str, parse_waiting_list_str, FileBackend, HierarchyStore,
    NewRoom,
};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "occupancy-cli",
    about = "Bed occupancy timeline, vacancies and waiting-list matching from JSON files."
)]
struct Cli {
    /// Directory holding the stored organisation hierarchy.
    #[arg(long, global = true, default_value = ".occupancy")]
    store_dir: PathBuf,
    /// Partial JSON config; missing fields keep their defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Days shown by the timeline.
    Window(WindowArgs),
    /// Stay bars placed on the timeline, per department.
    Gantt {
        #[command(flatten)]
        window: WindowArgs,
        #[arg(long)]
        stays: PathBuf,
        /// Only this department.
        #[arg(long)]
        department: Option<String>,
    },
    /// Suggest rooms for waiting-list entries.
    Suggest {
        #[arg(long)]
        waiting: PathBuf,
        /// Only this department's rooms.
        #[arg(long)]
        department: Option<String>,
        /// Skip beds occupied on the reference date (needs --stays).
        #[arg(long, requires = "stays")]
        vacant_only: bool,
        #[arg(long)]
        stays: Option<PathBuf>,
        #[arg(long)]
        date: Option<String>,
    },
    /// Beds available now or soon.
    Vacancies {
        #[arg(long)]
        stays: PathBuf,
        #[arg(long)]
        date: Option<String>,
    },
    /// Occupancy for the municipality and each organisation.
    Stats {
        #[arg(long)]
        stays: PathBuf,
        #[arg(long)]
        waiting: PathBuf,
        #[arg(long)]
        date: Option<String>,
    },
    /// Waiting list ordered by priority and waiting time.
    Waiting {
        #[arg(long)]
        waiting: PathBuf,
        #[arg(long)]
        date: Option<String>,
    },
    /// Edit the stored hierarchy.
    #[command(subcommand)]
    Rooms(RoomsCommand),
}

#[derive(Args, Debug)]
struct WindowArgs {
    /// Reference day (YYYY-MM-DD), defaults to today.
    #[arg(long)]
    date: Option<String>,
    #[arg(long, default_value = "week")]
    mode: String,
}

#[derive(Subcommand, Debug)]
enum RoomsCommand {
    List {
        #[arg(long)]
        org: String,
        #[arg(long)]
        dept: String,
    },
    Add {
        #[arg(long)]
        org: String,
        #[arg(long)]
        dept: String,
        #[arg(long)]
        label: String,
        /// Comma-separated capability tags.
        #[arg(long, default_value = "")]
        capabilities: String,
        #[arg(long, default_value_t = 1)]
        beds: usize,
    },
    Delete {
        #[arg(long)]
        org: String,
        #[arg(long)]
        dept: String,
        #[arg(long)]
        room: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => parse_config_str(&read_file(path)?)
            .with_context(|| format!("Invalid config in {path:?}"))?,
        None => OccupancyConfig::default(),
    };
    debug!(?config, store_dir = ?cli.store_dir, "starting");
    let mut store = HierarchyStore::new(FileBackend::new(&cli.store_dir));

    match cli.command {
        Command::Window(args) => {
            let window = build_window(reference_day(args.date.as_deref())?, parse_mode(&args.mode)?);
            if cli.json {
                return print_json(&window);
            }
            println!(
                "{} days: {} .. {}",
                window.len(),
                window.first(),
                window.last()
            );
        }
        Command::Gantt {
            window,
            stays,
            department,
        } => {
            let municipality = load_municipality(&mut store)?;
            let stays = load_stays(&stays)?;
            let window = build_window(reference_day(window.date.as_deref())?, parse_mode(&window.mode)?);
            let mut rows = municipality_rows(&municipality, &stays, &window);
            if let Some(department) = &department {
                for organisation in &mut rows {
                    organisation.departments.retain(|dept| &dept.id == department);
                }
                rows.retain(|organisation| !organisation.departments.is_empty());
                if rows.is_empty() {
                    bail!("Unknown department {department}");
                }
            }
            if cli.json {
                return print_json(&rows);
            }
            for department in rows.iter().flat_map(|org| &org.departments) {
                println!("{} ({} .. {})", department.name, window.first(), window.last());
                for room in &department.rooms {
                    for bed in &room.beds {
                        for bar in &bed.bars {
                            println!(
                                "  {} / {}: {} [{}] columns {}",
                                room.label, bed.label, bar.name, bar.status, bar.grid_column
                            );
                        }
                    }
                }
            }
        }
        Command::Suggest {
            waiting,
            department,
            vacant_only,
            stays,
            date,
        } => {
            let municipality = load_municipality(&mut store)?;
            let entries = load_waiting(&waiting)?;
            let rooms: Vec<&Room> = match &department {
                Some(department) => {
                    let (_, dept) = municipality
                        .find_department(department)
                        .with_context(|| format!("Unknown department {department}"))?;
                    dept.rooms.iter().collect()
                }
                None => municipality.rooms().collect(),
            };
            let stays = match &stays {
                Some(path) => load_stays(path)?,
                None => Vec::new(),
            };
            let occupied = occupied_beds(&stays, reference_day(date.as_deref())?);
            let suggestions = rank_suggestions_where(
                &entries,
                &rooms,
                config.suggestion_limit,
                &config.related_capabilities,
                |_, bed| !vacant_only || !occupied.contains(bed.id.as_str()),
            );
            if cli.json {
                return print_json(&suggestions);
            }
            for suggestion in &suggestions {
                println!(
                    "{} ({}) -> {} / {} score {}",
                    suggestion.entry_name,
                    suggestion.priority,
                    suggestion.room_label,
                    suggestion.bed_label,
                    suggestion.score
                );
            }
        }
        Command::Vacancies { stays, date } => {
            let municipality = load_municipality(&mut store)?;
            let stays = load_stays(&stays)?;
            let vacancies = rank_vacancies(&municipality, &stays, reference_day(date.as_deref())?, &config);
            if cli.json {
                return print_json(&vacancies);
            }
            for vacancy in &vacancies {
                println!(
                    "{} / {} / {} / {}: {}",
                    vacancy.organisation_name,
                    vacancy.department_name,
                    vacancy.room_label,
                    vacancy.bed_label,
                    vacancy.availability.label()
                );
            }
        }
        Command::Stats {
            stays,
            waiting,
            date,
        } => {
            let municipality = load_municipality(&mut store)?;
            let stays = load_stays(&stays)?;
            let entries = load_waiting(&waiting)?;
            let today = reference_day(date.as_deref())?;
            let summary = municipality_stats(&municipality, &stays, entries.len(), today);
            let organisations = organisation_stats(&municipality, &stays, today);
            if cli.json {
                return print_json(&(summary, organisations));
            }
            println!(
                "{}: {} of {} beds occupied ({}), {} waiting",
                municipality.name,
                summary.occupied_beds,
                summary.beds,
                summary.occupancy,
                summary.waiting_list
            );
            for organisation in &organisations {
                println!(
                    "  {}: {} of {} beds ({}), vacancy {}",
                    organisation.name,
                    organisation.occupied_beds,
                    organisation.beds,
                    organisation.occupancy,
                    organisation.vacancy
                );
            }
        }
        Command::Waiting { waiting, date } => {
            let entries = load_waiting(&waiting)?;
            let rows = process_waiting_list(&entries, reference_day(date.as_deref())?, config.waiting_list_limit);
            if cli.json {
                return print_json(&rows);
            }
            for row in &rows {
                println!(
                    "{} [{}] {} days, needs: {}",
                    row.entry.name,
                    row.entry.priority,
                    row.waiting_days,
                    row.entry.needs.join(", ")
                );
            }
            if let Some(average) = average_waiting_days(&rows) {
                println!("Average wait: {average:.1} days");
            }
        }
        Command::Rooms(command) => run_rooms(&mut store, command, cli.json)?,
    }

    Ok(())
}

fn run_rooms(
    store: &mut HierarchyStore<FileBackend>,
    command: RoomsCommand,
    json: bool,
) -> anyhow::Result<()> {
    match command {
        RoomsCommand::List { org, dept } => {
            let rooms = store.rooms(&org, &dept)?;
            if json {
                return print_json(&rooms);
            }
            for room in &rooms {
                println!(
                    "{} {} ({} beds) {}",
                    room.id,
                    room.label,
                    room.beds.len(),
                    room.capabilities.join(", ")
                );
            }
        }
        RoomsCommand::Add {
            org,
            dept,
            label,
            capabilities,
            beds,
        } => {
            let room = store.add_room(
                &org,
                &dept,
                NewRoom {
                    label,
                    capabilities,
                    beds,
                },
            )?;
            if json {
                return print_json(&room);
            }
            println!("Added {} ({}) with {} beds", room.label, room.id, room.beds.len());
        }
        RoomsCommand::Delete { org, dept, room } => {
            if !store.delete_room(&org, &dept, &room)? {
                bail!("No room {room} in {org}/{dept}");
            }
            println!("Deleted {room}");
        }
    }
    Ok(())
}

fn read_file(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("Could not read file {path:?}"))
}

fn load_municipality(store: &mut HierarchyStore<FileBackend>) -> anyhow::Result<Municipality> {
    store
        .load_municipality()
        .with_context(|| format!("Could not load hierarchy from {:?}", store.backend().dir()))
}

fn load_stays(path: &Path) -> anyhow::Result<Vec<PatientStay>> {
    parse_stays_str(&read_file(path)?).with_context(|| format!("Invalid stays in {path:?}"))
}

fn load_waiting(path: &Path) -> anyhow::Result<Vec<WaitingListEntry>> {
    parse_waiting_list_str(&read_file(path)?)
        .with_context(|| format!("Invalid waiting list in {path:?}"))
}

fn reference_day(date: Option<&str>) -> anyhow::Result<NaiveDate> {
    match date {
        Some(date) => Ok(parse_day(date)?),
        None => Ok(Local::now().date_naive()),
    }
}

fn parse_mode(mode: &str) -> anyhow::Result<WindowMode> {
    Ok(mode.parse::<WindowMode>()?)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
