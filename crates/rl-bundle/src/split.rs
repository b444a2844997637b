//! Size-bounded splitting of rendered blocks into parts.

use crate::manifest::part_name;
use crate::render::continuation_header;

/// One physical part, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartPlan {
    /// 1-based part number.
    pub number: usize,
    /// File name (`review.md`, `review_part2.md`, ...).
    pub name: String,
    /// Full text, continuation header included.
    pub text: String,
    /// Bytes of continuation header in `text` (0 for the primary part).
    pub overhead_bytes: usize,
    /// Number of blocks in this part.
    pub block_count: usize,
}

/// Byte length of the unsplit logical payload.
pub fn logical_payload_len(blocks: &[String]) -> usize {
    blocks.iter().map(String::len).sum()
}

/// Split blocks into parts of at most `max_part_size` bytes.
///
/// A block is never split: when the next block would overflow a part that
/// already holds at least one block, the part is flushed and the next one
/// starts with a continuation header. A single block larger than the limit
/// therefore gets a part of its own. At least one part is always returned.
pub fn split_blocks(blocks: &[String], max_part_size: usize) -> Vec<PartPlan> {
    let mut parts = Vec::new();
    let mut current = PartPlan {
        number: 1,
        name: part_name(1),
        text: String::new(),
        overhead_bytes: 0,
        block_count: 0,
    };

    for block in blocks {
        if current.block_count > 0 && current.text.len() + block.len() > max_part_size {
            let number = current.number + 1;
            let header = continuation_header(number);
            let next = PartPlan {
                number,
                name: part_name(number),
                overhead_bytes: header.len(),
                text: header,
                block_count: 0,
            };
            parts.push(std::mem::replace(&mut current, next));
        }
        current.text.push_str(block);
        current.block_count += 1;
    }

    parts.push(current);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn blocks(sizes: &[usize]) -> Vec<String> {
        sizes.iter().map(|n| "x".repeat(*n)).collect()
    }

    #[test]
    fn test_single_part_when_small() {
        let parts = split_blocks(&blocks(&[10, 20, 30]), 100);
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].name, "review.md");
        assert_eq!(parts[0].text.len(), 60);
        assert_eq!(parts[0].overhead_bytes, 0);
    }

    #[test]
    fn test_split_adds_continuation_header() {
        let parts = split_blocks(&blocks(&[60, 60, 60]), 100);
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1].name, "review_part2.md");
        assert!(parts[1].text.starts_with("# PR-Review (Part 2)\n\n"));
        assert_eq!(parts[2].name, "review_part3.md");
        assert_eq!(parts[1].overhead_bytes, continuation_header(2).len());
    }

    #[test]
    fn test_oversized_block_gets_own_part() {
        let parts = split_blocks(&blocks(&[10, 500, 10]), 100);
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1].block_count, 1);
        assert!(parts[1].text.len() > 100);
    }

    #[test]
    fn test_empty_input_yields_one_empty_part() {
        let parts = split_blocks(&[], 100);
        assert_eq!(parts.len(), 1);
        assert!(parts[0].text.is_empty());
    }

    proptest! {
        #[test]
        fn prop_split_preserves_payload(
            sizes in prop::collection::vec(1usize..400, 1..40),
            max in 50usize..1000,
        ) {
            let blocks = blocks(&sizes);
            let parts = split_blocks(&blocks, max);

            let emitted: usize = parts.iter().map(|p| p.text.len()).sum();
            let overhead: usize = parts.iter().map(|p| p.overhead_bytes).sum();
            prop_assert_eq!(emitted - overhead, logical_payload_len(&blocks));

            let total_blocks: usize = parts.iter().map(|p| p.block_count).sum();
            prop_assert_eq!(total_blocks, blocks.len());

            for (i, part) in parts.iter().enumerate() {
                prop_assert_eq!(part.number, i + 1);
                prop_assert!(part.block_count >= 1);
                if part.block_count > 1 {
                    prop_assert!(part.text.len() <= max);
                }
            }

            if logical_payload_len(&blocks) > max && blocks.len() > 1 {
                prop_assert!(parts.len() > 1);
            }
        }
    }
}
