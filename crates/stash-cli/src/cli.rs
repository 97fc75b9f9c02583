use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "stash",
    about = "Content-addressed item stash — pack stacks into cards and back",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Config file (created by `stash init`).
    #[arg(long, global = true, default_value = "stash.toml")]
    pub config: PathBuf,

    /// Inventory file the command operates on.
    #[arg(long, global = true, default_value = "inventory.json")]
    pub inventory: PathBuf,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Write a fresh config and an empty inventory
    Init(InitArgs),
    /// Add blank cards to the inventory
    Blank(BlankArgs),
    /// Add an item described in a JSON file to the inventory
    Add(AddArgs),
    /// Mint a card for an address already in the store
    Get(GetArgs),
    /// Pack the stack in a slot into a card
    Fill(SlotArgs),
    /// Unpack the card in a slot
    Open(SlotArgs),
    /// Inspect a slot: classification, depth, and contents summary
    Peek(SlotArgs),
    /// Opt the card in a slot out of hash migration
    Keep(SlotArgs),
    /// Rebuild every card in the inventory under the current hash scheme
    Migrate(MigrateArgs),
    /// Batch-pack matching stacks using blank cards from the inventory
    Batch(BatchArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// Directory for stored card contents.
    #[arg(long, default_value = "stash-objects")]
    pub data_dir: PathBuf,

    /// Number of inventory slots.
    #[arg(long, default_value_t = 27)]
    pub slots: usize,
}

#[derive(Args)]
pub struct BlankArgs {
    /// How many blank cards to add.
    #[arg(default_value_t = 1)]
    pub count: u32,
}

#[derive(Args)]
pub struct AddArgs {
    /// Path to a JSON item description.
    pub item: PathBuf,
}

#[derive(Args)]
pub struct GetArgs {
    /// Base-36 address of the stored contents.
    pub address: String,
}

#[derive(Args)]
pub struct SlotArgs {
    /// Slot index, zero-based.
    pub slot: usize,
}

#[derive(Args)]
pub struct MigrateArgs {}

#[derive(Args)]
pub struct BatchArgs {
    /// Slot holding the payload to batch.
    pub slot: usize,

    /// Cap on minted stacks.
    #[arg(long)]
    pub max_stacks: Option<u32>,
}
