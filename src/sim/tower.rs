//! Tower generation
//!
//! Lays out three blocks per layer and picks which interior blocks are
//! vulnerable. The RNG is supplied by the caller so a seeded engine always
//! builds the same towers.

use glam::Vec2;
use rand::Rng;
use rand::seq::SliceRandom;

use super::state::{Block, IdAllocator};
use crate::consts::BLOCKS_PER_LAYER;
use crate::levels::LevelDefinition;

/// Build a fresh tower for `level`
pub fn generate<R: Rng + ?Sized>(
    level: &LevelDefinition,
    rng: &mut R,
    ids: &mut IdAllocator,
) -> Vec<Block> {
    let layout = level.difficulty.layout();
    let size = Vec2::new(layout.width, layout.height);
    let mut blocks = Vec::with_capacity(level.block_count() as usize);

    for layer in 0..level.layers {
        // Even layers lie horizontally, odd layers are turned
        let horizontal = layer % 2 == 0;
        let y = layer as f32 * (layout.height + layout.spacing);

        for index in 0..BLOCKS_PER_LAYER {
            let x = index as f32 * (layout.width + layout.spacing);
            blocks.push(Block {
                id: ids.next_id(),
                layer,
                index_in_layer: index,
                removed: false,
                vulnerable: false,
                position: Vec2::new(x, y),
                rotation: if horizontal { 0.0 } else { 90.0 },
                size,
            });
        }
    }

    let marked = mark_vulnerable(&mut blocks, level, rng);
    log::info!(
        "Level {} tower: {} layers, {} blocks, {} vulnerable",
        level.id,
        level.layers,
        blocks.len(),
        marked
    );
    blocks
}

/// Shuffle the interior, non-removed blocks and flag the first
/// `min(vulnerable_blocks, candidates)`. Returns how many were flagged.
pub fn mark_vulnerable<R: Rng + ?Sized>(
    blocks: &mut [Block],
    level: &LevelDefinition,
    rng: &mut R,
) -> usize {
    let top = level.layers.saturating_sub(1);
    let mut candidates: Vec<usize> = blocks
        .iter()
        .enumerate()
        .filter(|(_, b)| !b.removed && b.layer > 0 && b.layer < top)
        .map(|(i, _)| i)
        .collect();
    candidates.shuffle(rng);

    let count = (level.vulnerable_blocks as usize).min(candidates.len());
    for &i in &candidates[..count] {
        blocks[i].vulnerable = true;
    }
    count
}
