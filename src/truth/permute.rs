//! Argument transpositions on 4-input truth tables.
//!
//! Exchanging argument positions `i` and `j` only moves the table entries whose
//! input index has bit `i` and bit `j` set differently. For a 4-input table there
//! are four such pairs per transposition; each pair is exchanged with
//! [`swap_bits`].

/// Entry pairs exchanged by each of the six transpositions, indexed by
/// [`transposition_index`].
const TRANSPOSITIONS: [[(u8, u8); 4]; 6] = [
    // 0 <-> 1
    [(1, 2), (5, 6), (9, 10), (13, 14)],
    // 0 <-> 2
    [(1, 4), (3, 6), (9, 12), (11, 14)],
    // 0 <-> 3
    [(1, 8), (3, 10), (5, 12), (7, 14)],
    // 1 <-> 2
    [(2, 4), (3, 5), (10, 12), (11, 13)],
    // 1 <-> 3
    [(2, 8), (3, 9), (6, 12), (7, 13)],
    // 2 <-> 3
    [(4, 8), (5, 9), (6, 10), (7, 11)],
];

/// Exchange bits `a` and `b` of `table`.
#[inline]
pub fn swap_bits(table: u16, a: u8, b: u8) -> u16 {
    let differ = ((table >> a) ^ (table >> b)) & 1;
    table ^ ((differ << a) | (differ << b))
}

fn transposition_index(i: usize, j: usize) -> usize {
    let (lo, hi) = if i < j { (i, j) } else { (j, i) };
    match (lo, hi) {
        (0, 1) => 0,
        (0, 2) => 1,
        (0, 3) => 2,
        (1, 2) => 3,
        (1, 3) => 4,
        (2, 3) => 5,
        _ => unreachable!("argument positions {} and {} out of range", i, j),
    }
}

/// Permute `table` so argument positions `i` and `j` trade places.
pub fn transpose(table: u16, i: usize, j: usize) -> u16 {
    if i == j {
        return table;
    }
    TRANSPOSITIONS[transposition_index(i, j)]
        .iter()
        .fold(table, |acc, &(a, b)| swap_bits(acc, a, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reference permutation by evaluating every input row.
    fn transpose_by_rows(table: u16, i: usize, j: usize) -> u16 {
        let mut result = 0u16;
        for row in 0..16u16 {
            let bi = (row >> i) & 1;
            let bj = (row >> j) & 1;
            let mut source = row & !((1 << i) | (1 << j));
            source |= (bi << j) | (bj << i);
            result |= ((table >> source) & 1) << row;
        }
        result
    }

    #[test]
    fn test_swap_bits() {
        assert_eq!(swap_bits(0b0010, 1, 2), 0b0100);
        assert_eq!(swap_bits(0b0110, 1, 2), 0b0110);
        assert_eq!(swap_bits(0x8000, 0, 15), 0x0001);
    }

    #[test]
    fn test_transpositions_match_row_permutation() {
        let samples = [
            0x0000, 0xFFFF, 0xAAAA, 0xCCCC, 0xF0F0, 0xFF00, 0x8000, 0x1234, 0x6996, 0xE8E8,
        ];
        for i in 0..4 {
            for j in 0..4 {
                for &table in &samples {
                    assert_eq!(
                        transpose(table, i, j),
                        transpose_by_rows(table, i, j),
                        "transpose({:#06x}, {}, {})",
                        table,
                        i,
                        j
                    );
                }
            }
        }
    }

    #[test]
    fn test_transpose_moves_argument_tables() {
        assert_eq!(transpose(0xAAAA, 0, 1), 0xCCCC);
        assert_eq!(transpose(0xAAAA, 0, 2), 0xF0F0);
        assert_eq!(transpose(0xAAAA, 3, 0), 0xFF00);
        assert_eq!(transpose(0xCCCC, 1, 3), 0xFF00);
    }

    #[test]
    fn test_transpose_is_an_involution() {
        for table in (0..=u16::MAX).step_by(97) {
            for (i, j) in [(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)] {
                assert_eq!(transpose(transpose(table, i, j), j, i), table);
            }
        }
    }
}
