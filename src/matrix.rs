/// A bitset trie that matches a streamed name against up to 63 candidates
/// in linear time with no allocation.
///
/// The table is a dense `width * height` grid of codepoints, `-1` padded
/// past the end of each candidate. Callers carry the active candidate set
/// as a 64-bit mask and narrow it one character at a time with
/// [update](StringMatrix::update); [exact](StringMatrix::exact) then drops
/// candidates the input only matched a proper prefix of.
#[derive(Debug, Clone)]
pub struct StringMatrix {
    width: usize,
    height: usize,
    lengths: Vec<u16>,
    initial: u64,
    // m[char_index * width + string_index]
    m: Vec<i32>,
}

impl StringMatrix {
    /// Build a matrix from 1..=63 non-empty candidate names.
    ///
    /// # Panics
    /// If the candidate count is out of range or a candidate is empty.
    pub fn new<S: AsRef<str>>(xs: &[S]) -> Self {
        let width = xs.len();
        assert!((1..=63).contains(&width), "1..=63 candidate names required");
        let lengths: Vec<u16> = xs
            .iter()
            .map(|x| {
                let len = x.as_ref().chars().count();
                assert!(len > 0, "empty candidate name");
                u16::try_from(len).expect("candidate name too long")
            })
            .collect();
        let height = lengths.iter().map(|&l| l as usize).max().unwrap_or(0);
        let mut m = vec![-1i32; width * height];
        for (s, x) in xs.iter().enumerate() {
            for (c, ch) in x.as_ref().chars().enumerate() {
                m[c * width + s] = ch as i32;
            }
        }
        Self {
            width,
            height,
            lengths,
            initial: (1u64 << width) - 1,
            m,
        }
    }

    /// The mask with every candidate bit set.
    pub fn initial(&self) -> u64 {
        self.initial
    }

    /// Clear the bit of every candidate whose character at `char_index`
    /// differs from `c`. Must be called with strictly increasing
    /// `char_index` starting at 0.
    pub fn update(&self, mask: u64, char_index: usize, c: char) -> u64 {
        if char_index >= self.height || mask == 0 {
            return 0;
        }
        let cp = c as i32;
        let row = &self.m[char_index * self.width..][..self.width];
        if mask == self.initial {
            // dense path: at char 0 every candidate is still live
            let mut out = 0u64;
            for (s, &v) in row.iter().enumerate() {
                if v == cp {
                    out |= 1 << s;
                }
            }
            out
        } else {
            let mut out = mask;
            let mut bits = mask;
            while bits != 0 {
                let s = bits.trailing_zeros() as usize;
                if row[s] != cp {
                    out &= !(1 << s);
                }
                bits &= bits - 1;
            }
            out
        }
    }

    /// Clear candidates whose length is not exactly `length`.
    pub fn exact(&self, mask: u64, length: usize) -> u64 {
        let mut out = mask;
        let mut bits = mask;
        while bits != 0 {
            let s = bits.trailing_zeros() as usize;
            if self.lengths[s] as usize != length {
                out &= !(1 << s);
            }
            bits &= bits - 1;
        }
        out
    }

    /// Lowest set bit index, or -1 for an empty mask.
    pub fn first(&self, mask: u64) -> i32 {
        if mask == 0 {
            -1
        } else {
            mask.trailing_zeros() as i32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ordinal(matrix: &StringMatrix, s: &str) -> i32 {
        let mut mask = matrix.initial();
        for (i, c) in s.chars().enumerate() {
            mask = matrix.update(mask, i, c);
        }
        matrix.first(matrix.exact(mask, s.chars().count()))
    }

    #[test]
    fn matches_each_candidate() {
        let names = ["rows", "status", "origin_addresses", "destination_addresses"];
        let matrix = StringMatrix::new(&names);
        for (i, name) in names.iter().enumerate() {
            assert_eq!(ordinal(&matrix, name), i as i32);
        }
    }

    #[test]
    fn rejects_non_candidates() {
        let matrix = StringMatrix::new(&["alpha", "alphabet", "beta"]);
        assert_eq!(ordinal(&matrix, "alpha"), 0);
        assert_eq!(ordinal(&matrix, "alphabet"), 1);
        // proper prefix of a candidate
        assert_eq!(ordinal(&matrix, "alph"), -1);
        // proper extension of a candidate
        assert_eq!(ordinal(&matrix, "betas"), -1);
        assert_eq!(ordinal(&matrix, "gamma"), -1);
        assert_eq!(ordinal(&matrix, ""), -1);
    }

    #[test]
    fn update_past_height_is_empty() {
        let matrix = StringMatrix::new(&["ab"]);
        let mask = matrix.update(matrix.initial(), 0, 'a');
        let mask = matrix.update(mask, 1, 'b');
        assert_eq!(matrix.update(mask, 2, 'c'), 0);
    }

    #[test]
    fn sparse_path_after_first_narrowing() {
        let matrix = StringMatrix::new(&["aa", "ab", "ba"]);
        let mask = matrix.update(matrix.initial(), 0, 'a');
        assert_eq!(mask, 0b011);
        let mask = matrix.update(mask, 1, 'b');
        assert_eq!(mask, 0b010);
        assert_eq!(matrix.first(mask), 1);
    }

    #[test]
    fn full_width() {
        let names: Vec<String> = (0..63).map(|i| format!("field{i}")).collect();
        let matrix = StringMatrix::new(&names);
        assert_eq!(matrix.initial(), (1u64 << 63) - 1);
        assert_eq!(ordinal(&matrix, "field62"), 62);
    }
}
