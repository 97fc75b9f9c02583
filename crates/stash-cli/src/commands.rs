use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use colored::Colorize;

use stash_batch::{BatchAssembler, BatchRequest, CollectOverflow};
use stash_cache::BoundedCache;
use stash_core::{mark_keep, Stash};
use stash_migrate::Migrator;
use stash_store::{FsObjectStore, ObjectStore};
use stash_types::card::{blank_card, card_address, classify, CardKind};
use stash_types::{Address, Item, SlotCollection, VecSlots};

use crate::cli::{BatchArgs, Cli, Command, InitArgs, SlotArgs};
use crate::config::StashConfig;
use crate::inventory;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let Cli {
        command,
        config: config_path,
        inventory: inventory_path,
        ..
    } = cli;

    // Harmless before `init`: a missing config loads defaults, and the
    // store only touches disk on first write.
    let config = StashConfig::load(&config_path)?;
    let store: Arc<dyn ObjectStore> = Arc::new(FsObjectStore::new(&config.data_dir));
    let cache = Arc::new(BoundedCache::new(store, config.cache_config()));
    let stash = Arc::new(Stash::new(Arc::clone(&cache)));

    let result = match command {
        Command::Init(args) => cmd_init(&config_path, &inventory_path, args),
        Command::Blank(args) => cmd_blank(&inventory_path, args.count),
        Command::Add(args) => cmd_add(&inventory_path, &args.item),
        Command::Get(args) => cmd_get(&stash, &inventory_path, &args.address),
        Command::Fill(args) => cmd_fill(&stash, &inventory_path, args),
        Command::Open(args) => cmd_open(&stash, &inventory_path, args),
        Command::Peek(args) => cmd_peek(&stash, &inventory_path, args),
        Command::Keep(args) => cmd_keep(&inventory_path, args),
        Command::Migrate(_) => cmd_migrate(&stash, &inventory_path),
        Command::Batch(args) => cmd_batch(&stash, &inventory_path, args),
    };

    // Deferred write-back: persist whatever the command left dirty.
    cache.flush();
    result
}

fn cmd_init(config_path: &Path, inventory_path: &Path, args: InitArgs) -> anyhow::Result<()> {
    let config = StashConfig {
        data_dir: args.data_dir,
        ..StashConfig::default()
    };
    config.save(config_path)?;
    inventory::save(inventory_path, &VecSlots::new(args.slots))?;

    println!(
        "{} Initialized stash (config: {}, inventory: {} slots)",
        "✓".green().bold(),
        config_path.display().to_string().bold(),
        args.slots
    );
    Ok(())
}

fn cmd_blank(inventory_path: &Path, count: u32) -> anyhow::Result<()> {
    let mut slots = inventory::load(inventory_path)?;
    let mut items = slots.read_all();
    let blank = blank_card();

    let mut remaining = count;
    for slot in items.iter_mut() {
        if remaining == 0 {
            break;
        }
        match slot {
            Some(item) if item.same_content(&blank) && item.quantity < item.max_stack => {
                let add = (item.max_stack - item.quantity).min(remaining);
                item.quantity += add;
                remaining -= add;
            }
            None => {
                let mut stack = blank.clone();
                stack.quantity = remaining.min(blank.max_stack);
                remaining -= stack.quantity;
                *slot = Some(stack);
            }
            _ => {}
        }
    }
    if remaining > 0 {
        bail!("inventory full, {remaining} blank cards did not fit");
    }

    slots.replace_all(items);
    inventory::save(inventory_path, &slots)?;
    println!("{} Added {} blank card(s)", "✓".green(), count);
    Ok(())
}

fn cmd_add(inventory_path: &Path, item_path: &Path) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(item_path)
        .with_context(|| format!("reading item {}", item_path.display()))?;
    let item: Item =
        serde_json::from_str(&text).with_context(|| format!("parsing item {}", item_path.display()))?;

    let mut slots = inventory::load(inventory_path)?;
    let Some(index) = slots.place(item.clone()) else {
        bail!("inventory full");
    };
    inventory::save(inventory_path, &slots)?;
    println!(
        "{} Added {} {} to slot {index}",
        "✓".green(),
        item.quantity,
        item.kind.bold()
    );
    Ok(())
}

fn cmd_get(stash: &Stash, inventory_path: &Path, address: &str) -> anyhow::Result<()> {
    let address = Address::from_base36(address)?;
    let Some(card) = stash.card_for_address(&address) else {
        bail!("nothing stored at {address}");
    };

    let mut slots = inventory::load(inventory_path)?;
    let Some(index) = slots.place(card) else {
        bail!("inventory full");
    };
    inventory::save(inventory_path, &slots)?;
    println!(
        "{} Minted card {} into slot {index}",
        "✓".green(),
        address.short().cyan()
    );
    Ok(())
}

fn cmd_fill(stash: &Stash, inventory_path: &Path, args: SlotArgs) -> anyhow::Result<()> {
    let mut slots = inventory::load(inventory_path)?;
    let Some(item) = slots.get(args.slot).cloned() else {
        bail!("slot {} is empty", args.slot);
    };

    let card = match stash.fill(&item) {
        Ok(card) => card,
        Err(e) => bail!("cannot pack slot {}: {e}", args.slot),
    };
    let address = card_address(&card).context("minted card carries no address")?;
    slots.set(args.slot, Some(card));
    inventory::save(inventory_path, &slots)?;

    println!(
        "{} Packed {} {} into card {}",
        "✓".green(),
        item.quantity,
        item.kind.bold(),
        address.short().cyan()
    );
    Ok(())
}

fn cmd_open(stash: &Stash, inventory_path: &Path, args: SlotArgs) -> anyhow::Result<()> {
    let mut slots = inventory::load(inventory_path)?;
    let Some(card) = slots.get(args.slot).cloned() else {
        bail!("slot {} is empty", args.slot);
    };
    if !matches!(classify(&card), CardKind::Filled(_)) {
        bail!("slot {} does not hold a filled card", args.slot);
    }

    let contents = stash.open(&card);
    if card.quantity > 1 {
        // Peel one card off the stack; the contents need their own slot.
        let mut rest = card;
        rest.quantity -= 1;
        slots.set(args.slot, Some(rest));
        if slots.place(contents.clone()).is_none() {
            bail!("inventory full, cannot unpack");
        }
    } else {
        slots.set(args.slot, Some(contents.clone()));
    }
    inventory::save(inventory_path, &slots)?;

    println!(
        "{} Unpacked {} {}",
        "✓".green(),
        contents.quantity,
        contents.kind.bold()
    );
    Ok(())
}

fn cmd_peek(stash: &Stash, inventory_path: &Path, args: SlotArgs) -> anyhow::Result<()> {
    let slots = inventory::load(inventory_path)?;
    let Some(item) = slots.get(args.slot) else {
        println!("slot {}: {}", args.slot, "empty".dimmed());
        return Ok(());
    };

    println!("slot {}: {} x{}", args.slot, item.kind.bold(), item.quantity);
    match classify(item) {
        CardKind::Raw => println!("  raw content"),
        CardKind::Blank => println!("  blank card"),
        CardKind::Filled(address) => {
            println!("  filled card at {}", address.to_base36().cyan());
            println!("  depth: {}", stash.depth(item));
            if let Some(summary) = stash.summary(item) {
                println!(
                    "  holds: {} {} in total",
                    summary.total_quantity,
                    summary.root.kind.bold()
                );
            }
        }
    }
    Ok(())
}

fn cmd_keep(inventory_path: &Path, args: SlotArgs) -> anyhow::Result<()> {
    let mut slots = inventory::load(inventory_path)?;
    let Some(mut item) = slots.get(args.slot).cloned() else {
        bail!("slot {} is empty", args.slot);
    };
    if !mark_keep(&mut item) {
        bail!("slot {} does not hold a filled card", args.slot);
    }
    slots.set(args.slot, Some(item));
    inventory::save(inventory_path, &slots)?;
    println!("{} Card in slot {} will keep its address", "✓".green(), args.slot);
    Ok(())
}

fn cmd_migrate(stash: &Arc<Stash>, inventory_path: &Path) -> anyhow::Result<()> {
    let mut slots = inventory::load(inventory_path)?;
    let converted = Migrator::new(Arc::clone(stash)).migrate(&mut slots);
    inventory::save(inventory_path, &slots)?;
    println!("{} Converted {} item(s)", "✓".green(), converted);
    Ok(())
}

fn cmd_batch(stash: &Arc<Stash>, inventory_path: &Path, args: BatchArgs) -> anyhow::Result<()> {
    let mut slots = inventory::load(inventory_path)?;
    let Some(payload) = slots.get(args.slot).cloned() else {
        bail!("slot {} is empty", args.slot);
    };

    let request = BatchRequest {
        payload,
        max_stacks: args.max_stacks,
    };
    let mut sink = CollectOverflow::default();
    let outcome = BatchAssembler::new(Arc::clone(stash))
        .assemble(&mut slots, &mut sink, &request)
        .with_context(|| format!("batching slot {}", args.slot))?;
    inventory::save(inventory_path, &slots)?;

    println!("{} Minted {} card(s)", "✓".green(), outcome.stacks);
    for dropped in &sink.items {
        println!(
            "  {} {} card(s) did not fit and were dropped",
            "!".yellow(),
            dropped.quantity
        );
    }
    Ok(())
}
