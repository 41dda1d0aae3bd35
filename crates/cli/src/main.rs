use clap::{Parser, Subcommand};
use std::path::PathBuf;
use wardline_core::model::{BedStatus, BedType, NewBed, NewRoom, RoomType};
use wardline_core::{BedFilter, CoreConfig, RecordId, WardServices};
use wardline_types::{NonEmptyText, SequenceKey};

#[derive(Parser)]
#[command(name = "wardline")]
#[command(about = "Wardline admission and bed management CLI")]
struct Cli {
    /// Directory holding the ward store snapshot
    #[arg(long, default_value = "ward_data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a room
    CreateRoom {
        /// Facility-wide unique room number, e.g. 3-301
        room_number: String,
        /// ward | semi_private | private | icu | isolation
        room_type: String,
        /// Floor the room is on
        floor: i16,
        /// Owning department, e.g. general-medicine
        department: String,
        /// Maximum number of beds
        #[arg(long, default_value_t = 4)]
        capacity: u8,
    },
    /// Add a bed to a room
    CreateBed {
        /// Room id (32-hex)
        room_id: String,
        /// Bed number within the room, e.g. A
        bed_number: String,
        /// standard | electric | icu | bariatric | paediatric
        #[arg(long, default_value = "standard")]
        bed_type: String,
        /// Capability tags (comma-separated), e.g. ventilator,negative-pressure
        #[arg(long)]
        capabilities: Option<String>,
    },
    /// List rooms
    Rooms,
    /// List beds, optionally filtered
    Beds {
        /// available | occupied | maintenance | reserved | cleaning
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        department: Option<String>,
        #[arg(long)]
        floor: Option<i16>,
    },
    /// Show a bed's status audit history, newest first
    BedHistory {
        /// Bed id (32-hex)
        bed_id: String,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Issue the next identifier of a sequence family
    NextId {
        /// Sequence family, e.g. admission or mrn
        sequence: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = CoreConfig::new(
        Some(cli.data_dir.clone()),
        NonEmptyText::new("wardline-cli").map_err(|e| anyhow::anyhow!(e.to_string()))?,
    )?;
    let services = WardServices::open(&cfg)?;

    match cli.command {
        Some(Commands::CreateRoom {
            room_number,
            room_type,
            floor,
            department,
            capacity,
        }) => {
            let room = services.registry.create_room(NewRoom {
                room_number: NonEmptyText::new(room_number)
                    .map_err(|e| anyhow::anyhow!(e.to_string()))?,
                room_type: room_type.parse::<RoomType>()?,
                floor,
                department: NonEmptyText::new(department)
                    .map_err(|e| anyhow::anyhow!(e.to_string()))?,
                bed_capacity: capacity,
            })?;
            println!("created room {} ({})", room.room_number, room.id);
        }
        Some(Commands::CreateBed {
            room_id,
            bed_number,
            bed_type,
            capabilities,
        }) => {
            let room_id = RecordId::parse(&room_id)?;
            let capabilities = capabilities
                .map(|tags| {
                    tags.split(',')
                        .map(|t| t.trim().to_string())
                        .filter(|t| !t.is_empty())
                        .collect()
                })
                .unwrap_or_default();
            let bed = services.registry.create_bed(
                &room_id,
                NewBed {
                    bed_number: NonEmptyText::new(bed_number)
                        .map_err(|e| anyhow::anyhow!(e.to_string()))?,
                    bed_type: bed_type.parse::<BedType>()?,
                    capabilities,
                },
            )?;
            println!("created bed {} ({})", bed.bed_number, bed.id);
        }
        Some(Commands::Rooms) => {
            for room in services.registry.list_rooms()? {
                println!(
                    "{}  {}  floor {}  {}  capacity {}  {}",
                    room.id,
                    room.room_number,
                    room.floor,
                    room.department,
                    room.bed_capacity,
                    if room.operational {
                        "operational"
                    } else {
                        "closed"
                    }
                );
            }
        }
        Some(Commands::Beds {
            status,
            department,
            floor,
        }) => {
            let filter = BedFilter {
                status: status.map(|s| s.parse::<BedStatus>()).transpose()?,
                bed_type: None,
                department,
                floor,
            };
            for bed in services.registry.list_beds(&filter)? {
                println!("{}  bed {}  {}  {}", bed.id, bed.bed_number, bed.bed_type, bed.status);
            }
        }
        Some(Commands::BedHistory { bed_id, limit }) => {
            let bed_id = RecordId::parse(&bed_id)?;
            for row in services.registry.bed_history(&bed_id, limit)? {
                println!(
                    "{}  {} -> {}  by {}  {}",
                    row.changed_at.to_rfc3339(),
                    row.old_status,
                    row.new_status,
                    row.changed_by,
                    row.reason
                );
            }
        }
        Some(Commands::NextId { sequence }) => {
            let key = SequenceKey::new(&sequence).map_err(|e| anyhow::anyhow!(e.to_string()))?;
            println!("{}", services.sequences.next_value(&key)?);
        }
        None => {
            println!("wardline: use --help to list commands");
        }
    }

    Ok(())
}
