/// Dense 2-D arena addressed by `(x, y)`.
///
/// Every cell is populated at construction, so lookups never observe an
/// unset entry. Storage is row-major (`y` outer).
#[derive(Debug, Clone, PartialEq)]
pub struct Grid2<T> {
    width: usize,
    height: usize,
    items: Vec<T>,
}

impl<T> Grid2<T> {
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut items = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                items.push(f(x, y));
            }
        }
        Grid2 {
            width,
            height,
            items,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn index(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.width && y < self.height).then_some(y * self.width + x)
    }

    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        self.index(x, y).map(|i| &self.items[i])
    }

    pub fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut T> {
        self.index(x, y).map(|i| &mut self.items[i])
    }

    /// Mutable access to two distinct cells at once.
    pub fn pair_mut(&mut self, a: (usize, usize), b: (usize, usize)) -> Option<(&mut T, &mut T)> {
        let ia = self.index(a.0, a.1)?;
        let ib = self.index(b.0, b.1)?;
        if ia == ib {
            return None;
        }
        if ia < ib {
            let (lo, hi) = self.items.split_at_mut(ib);
            Some((&mut lo[ia], &mut hi[0]))
        } else {
            let (lo, hi) = self.items.split_at_mut(ia);
            Some((&mut hi[0], &mut lo[ib]))
        }
    }

    /// Cells in storage order together with their `(x, y)` index.
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), &T)> {
        let width = self.width;
        self.items
            .iter()
            .enumerate()
            .map(move |(i, v)| ((i % width, i / width), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = ((usize, usize), &mut T)> {
        let width = self.width;
        self.items
            .iter_mut()
            .enumerate()
            .map(move |(i, v)| ((i % width, i / width), v))
    }

    /// Cell at storage position `i`.
    pub fn nth_mut(&mut self, i: usize) -> Option<&mut T> {
        self.items.get_mut(i)
    }
}

#[cfg(test)]
mod tests {
    use super::Grid2;

    #[test]
    fn populates_every_cell() {
        let g = Grid2::from_fn(3, 2, |x, y| (x, y));
        assert_eq!(g.len(), 6);
        assert_eq!(g.get(2, 1), Some(&(2, 1)));
        assert_eq!(g.get(3, 0), None);
        assert!(g.iter().all(|(idx, v)| idx == *v));
    }

    #[test]
    fn pair_mut_returns_requested_order() {
        let mut g = Grid2::from_fn(2, 2, |x, y| x + 10 * y);
        let (a, b) = g.pair_mut((1, 1), (0, 0)).expect("distinct cells");
        assert_eq!((*a, *b), (11, 0));
        std::mem::swap(a, b);
        assert_eq!(g.get(0, 0), Some(&11));
        assert!(g.pair_mut((1, 0), (1, 0)).is_none());
    }
}
