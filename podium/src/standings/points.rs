//! Point allocation by finishing position.
//!
//! With `n` participants, position `k` earns `n - k + 1` points, plus a
//! podium bonus of 4, 2 and 1 for the first three positions. Tied
//! participants share the mean of the positions they jointly occupy and all
//! take the first rank of their block.

/// Podium bonus for positions 1, 2 and 3
pub const PODIUM_BONUS: [f64; 3] = [4.0, 2.0, 1.0];

/// Points earned by a single 1-indexed position
pub fn points_for_position(participants: usize, position: usize) -> f64 {
    if position == 0 || position > participants {
        return 0.0;
    }
    let base = (participants - position + 1) as f64;
    base + PODIUM_BONUS.get(position - 1).copied().unwrap_or(0.0)
}

/// Rank and points assigned to one participant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub rank: u32,
    pub points: f64,
}

/// Place tied groups in order; every member of a group shares its placement
pub fn place_groups(participants: usize, group_sizes: &[usize]) -> Vec<Placement> {
    let mut placements = Vec::with_capacity(group_sizes.len());
    let mut position = 1;

    for &size in group_sizes {
        if size == 0 {
            continue;
        }
        let total: f64 = (position..position + size)
            .map(|p| points_for_position(participants, p))
            .sum();
        placements.push(Placement {
            rank: position as u32,
            points: total / size as f64,
        });
        position += size;
    }

    placements
}

/// Place an already ordered list where the first `cutoff` entries keep
/// individual positions and later entries tie whenever `same_block` holds for
/// neighbours.
pub fn place_with_cutoff<T>(
    participants: usize,
    ordered: &[T],
    cutoff: usize,
    mut same_block: impl FnMut(&T, &T) -> bool,
) -> Vec<Placement> {
    let head = cutoff.min(ordered.len());
    let mut placements: Vec<Placement> = (1..=head)
        .map(|position| Placement {
            rank: position as u32,
            points: points_for_position(participants, position),
        })
        .collect();

    let tail = &ordered[head..];
    let mut sizes = Vec::new();
    let mut start = 0;
    for i in 0..tail.len() {
        let closes_block = i + 1 == tail.len() || !same_block(&tail[i], &tail[i + 1]);
        if closes_block {
            sizes.push(i + 1 - start);
            start = i + 1;
        }
    }

    let mut position = head + 1;
    for size in sizes {
        let total: f64 = (position..position + size)
            .map(|p| points_for_position(participants, p))
            .sum();
        let placement = Placement {
            rank: position as u32,
            points: total / size as f64,
        };
        placements.extend(std::iter::repeat_n(placement, size));
        position += size;
    }

    placements
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eight_participants_without_ties() {
        let expected = [12.0, 9.0, 7.0, 5.0, 4.0, 3.0, 2.0, 1.0];
        for (i, points) in expected.iter().enumerate() {
            assert_eq!(points_for_position(8, i + 1), *points, "position {}", i + 1);
        }
        assert_eq!(points_for_position(8, 0), 0.0);
        assert_eq!(points_for_position(8, 9), 0.0);
    }

    #[test]
    fn test_tie_for_first_shares_average() {
        let placements = place_groups(8, &[2, 1, 1, 1, 1, 1, 1]);
        assert_eq!(placements[0], Placement { rank: 1, points: 10.5 });
        assert_eq!(placements[1], Placement { rank: 3, points: 7.0 });
        assert_eq!(placements.last().unwrap().rank, 8);
    }

    #[test]
    fn test_cutoff_keeps_top_positions_individual() {
        // Six entries with identical keys: the first four stay individual,
        // the last two share positions five and six.
        let keys = [0.5; 6];
        let placements = place_with_cutoff(6, &keys, 4, |a, b| a == b);

        let ranks: Vec<u32> = placements.iter().map(|p| p.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4, 5, 5]);
        assert_eq!(placements[0].points, 10.0);
        assert_eq!(placements[3].points, 3.0);
        assert_eq!(placements[4].points, 1.5);
        assert_eq!(placements[5].points, 1.5);
    }

    #[test]
    fn test_cutoff_splits_distinct_tail() {
        let keys = [1.0, 0.75, 0.5, 0.5, 0.25, 0.25, 0.25, 0.0];
        let placements = place_with_cutoff(8, &keys, 4, |a, b| a == b);

        let ranks: Vec<u32> = placements.iter().map(|p| p.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4, 5, 5, 5, 8]);
        assert_eq!(placements[4].points, 3.0);
        assert_eq!(placements[7].points, 1.0);
    }

    #[test]
    fn test_short_list() {
        let placements = place_with_cutoff(3, &[1, 2, 3], 4, |a, b| a == b);
        assert_eq!(placements.len(), 3);
        assert_eq!(placements[2], Placement { rank: 3, points: 2.0 });
    }
}
