//! Batch card assembly.
//!
//! The [`BatchAssembler`] turns many small matching stacks spread across a
//! slot collection into one aggregated filled card: it consumes one blank
//! card plus one full payload stack per minted stack, then places a card of
//! quantity `stacks` back into the collection.
//!
//! The operation is two explicit phases over an owned copy of the slots:
//! a pure *plan* (which slots, how much) and an all-or-nothing *apply*.
//! Nothing touches the real collection until the single `replace_all` at
//! the end, so every failure path — nothing to batch, a fill error, the
//! overflow sink refusing the remainder — leaves the collection exactly as
//! it was.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use stash_core::{FillError, Stash};
use stash_types::card::blank_card;
use stash_types::{Item, SlotCollection};

/// Receives stacks that cannot be placed back into the slot collection
/// (the drop-in-world collaborator in the origin domain).
pub trait OverflowSink {
    /// Offer a stack. Returning `false` rejects it, which aborts and rolls
    /// back the whole batch operation.
    fn offer(&mut self, item: Item) -> bool;
}

/// An [`OverflowSink`] that accepts everything and keeps it.
#[derive(Debug, Default)]
pub struct CollectOverflow {
    /// Stacks handed to the sink, in order.
    pub items: Vec<Item>,
}

impl OverflowSink for CollectOverflow {
    fn offer(&mut self, item: Item) -> bool {
        self.items.push(item);
        true
    }
}

/// What to batch.
#[derive(Clone, Debug)]
pub struct BatchRequest {
    /// The payload content to aggregate. One full stack of this content is
    /// consumed per minted stack.
    pub payload: Item,
    /// Cap on minted stacks. `None` mints as many as the slots allow.
    pub max_stacks: Option<u32>,
}

/// Result of a committed batch operation.
#[derive(Clone, Debug)]
pub struct BatchOutcome {
    /// The minted card description, quantity set to `stacks`.
    pub card: Item,
    /// Stacks minted (cards created).
    pub stacks: u32,
    /// How many of them went to the overflow sink instead of a slot.
    pub overflowed: u32,
}

/// Errors from batch assembly.
#[derive(Debug, Error)]
pub enum BatchError {
    /// Not enough blanks or payload to mint a single stack. Nothing was
    /// mutated.
    #[error("nothing to batch")]
    NothingToBatch,

    /// The overflow sink refused the unplaceable remainder; the operation
    /// was rolled back.
    #[error("overflow rejected, batch rolled back")]
    OverflowRejected,

    /// Minting the aggregated card failed. Nothing was committed.
    #[error(transparent)]
    Fill(#[from] FillError),

    /// The apply phase contradicted the plan. This is a programming error,
    /// not a user-facing condition: the plan already guaranteed
    /// sufficiency.
    #[error("batch plan violated: {0}")]
    Internal(String),
}

/// Per-slot share of a planned removal.
type PlannedSlot = (usize, u32);

/// Mints aggregated cards from blanks and payload spread across slots.
pub struct BatchAssembler {
    stash: Arc<Stash>,
}

impl BatchAssembler {
    /// Create an assembler minting through `stash`.
    pub fn new(stash: Arc<Stash>) -> Self {
        Self { stash }
    }

    /// Run one batch operation against `slots`.
    ///
    /// Consumes `stacks` blanks and `stacks` full payload stacks, where
    /// `stacks = min(blank total, payload total / stack size)` bounded by
    /// the request cap, and places one card of quantity `stacks` back.
    pub fn assemble(
        &self,
        slots: &mut dyn SlotCollection,
        sink: &mut dyn OverflowSink,
        request: &BatchRequest,
    ) -> Result<BatchOutcome, BatchError> {
        let payload = &request.payload;
        let blank = blank_card();
        let unit_size = u64::from(payload.max_stack);
        let payload_is_blank = payload.same_content(&blank);

        // Plan: one pass in slot order, tallying both classes.
        let mut working = slots.read_all();
        let mut blank_slots: Vec<PlannedSlot> = Vec::new();
        let mut payload_slots: Vec<PlannedSlot> = Vec::new();
        let mut blank_total: u64 = 0;
        let mut payload_total: u64 = 0;
        for (index, slot) in working.iter().enumerate() {
            let Some(item) = slot else { continue };
            if item.same_content(&blank) {
                blank_slots.push((index, item.quantity));
                blank_total += u64::from(item.quantity);
            } else if item.same_content(payload) {
                payload_slots.push((index, item.quantity));
                payload_total += u64::from(item.quantity);
            }
        }

        let mintable = if payload_is_blank {
            // One pool serves both classes: each minted stack consumes a
            // full stack of blanks as payload plus one more as the card.
            blank_total / (unit_size + 1)
        } else {
            blank_total.min(payload_total / unit_size)
        };
        let mut stacks = u32::try_from(mintable).unwrap_or(u32::MAX);
        if let Some(cap) = request.max_stacks {
            stacks = stacks.min(cap);
        }
        if stacks == 0 {
            return Err(BatchError::NothingToBatch);
        }
        debug!(stacks, blank_total, payload_total, "batch plan");

        // Apply, on the owned copy only.
        if payload_is_blank {
            consume(
                &mut working,
                &blank_slots,
                u64::from(stacks) * (unit_size + 1),
            )?;
        } else {
            consume(&mut working, &blank_slots, u64::from(stacks))?;
            consume(&mut working, &payload_slots, u64::from(stacks) * unit_size)?;
        }

        // Mint one fresh full payload stack and aggregate onto the card.
        let mut unit = payload.clone();
        unit.quantity = payload.max_stack;
        let mut card = self.stash.fill(&unit)?;
        card.quantity = stacks;

        let overflowed = place(&mut working, &card);
        if overflowed > 0 {
            let mut excess = card.clone();
            excess.quantity = overflowed;
            if !sink.offer(excess) {
                debug!(overflowed, "overflow rejected, abandoning batch");
                return Err(BatchError::OverflowRejected);
            }
        }

        slots.replace_all(working);
        Ok(BatchOutcome {
            card,
            stacks,
            overflowed,
        })
    }
}

impl std::fmt::Debug for BatchAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchAssembler").finish()
    }
}

/// Remove `target` units from the planned slots, earliest-scanned first.
///
/// The plan already proved sufficiency, so falling short here is an
/// invariant violation, not a user condition.
fn consume(
    working: &mut [Option<Item>],
    planned: &[PlannedSlot],
    mut target: u64,
) -> Result<(), BatchError> {
    for &(index, available) in planned {
        if target == 0 {
            break;
        }
        let slot = working
            .get_mut(index)
            .ok_or_else(|| BatchError::Internal(format!("planned slot {index} out of range")))?;
        let Some(item) = slot.as_mut() else {
            return Err(BatchError::Internal(format!(
                "planned slot {index} is empty"
            )));
        };
        let take = u64::from(available).min(target) as u32;
        if item.quantity < take {
            return Err(BatchError::Internal(format!(
                "planned slot {index} holds {} units, needed {take}",
                item.quantity
            )));
        }
        item.quantity -= take;
        if item.quantity == 0 {
            *slot = None;
        }
        target -= u64::from(take);
    }
    if target != 0 {
        return Err(BatchError::Internal(format!(
            "{target} units short during removal"
        )));
    }
    Ok(())
}

/// Place the minted card, topping up partially-filled compatible slots
/// first, then empty slots. Returns the quantity that found no home.
fn place(working: &mut [Option<Item>], card: &Item) -> u32 {
    let mut remaining = card.quantity;

    for slot in working.iter_mut() {
        if remaining == 0 {
            return 0;
        }
        let Some(item) = slot.as_mut() else { continue };
        if item.same_content(card) && item.quantity < item.max_stack {
            let add = (item.max_stack - item.quantity).min(remaining);
            item.quantity += add;
            remaining -= add;
        }
    }

    for slot in working.iter_mut() {
        if remaining == 0 {
            return 0;
        }
        if slot.is_none() {
            let mut stack = card.clone();
            stack.quantity = remaining.min(card.max_stack);
            remaining -= stack.quantity;
            *slot = Some(stack);
        }
    }

    remaining
}
