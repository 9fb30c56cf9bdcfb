use std::collections::VecDeque;

use super::types::GridPosition;

/// Body segments, head first. Never empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snake {
    body: VecDeque<GridPosition>,
}

impl Snake {
    pub fn new(head: GridPosition) -> Self {
        Self {
            body: VecDeque::from([head]),
        }
    }

    /// `None` for an empty segment list.
    pub fn from_segments(segments: Vec<GridPosition>) -> Option<Self> {
        if segments.is_empty() {
            return None;
        }
        Some(Self {
            body: VecDeque::from(segments),
        })
    }

    pub fn head(&self) -> GridPosition {
        *self.body.front().expect("Snake body should never be empty")
    }

    /// The segment right behind the head, if any.
    pub fn neck(&self) -> Option<GridPosition> {
        self.body.get(1).copied()
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn segments(&self) -> impl Iterator<Item = &GridPosition> {
        self.body.iter()
    }

    pub fn to_vec(&self) -> Vec<GridPosition> {
        self.body.iter().copied().collect()
    }

    pub fn contains(&self, pos: GridPosition) -> bool {
        self.body.contains(&pos)
    }

    /// Whether `pos` hits a segment, ignoring the first `skip` segments from
    /// the head. The tail counts: it has not moved yet when this is checked.
    pub fn collides_with(&self, pos: GridPosition, skip: usize) -> bool {
        self.body.iter().skip(skip).any(|segment| *segment == pos)
    }

    pub fn grow_to(&mut self, new_head: GridPosition) {
        self.body.push_front(new_head);
    }

    pub fn slither_to(&mut self, new_head: GridPosition) {
        self.body.push_front(new_head);
        self.body.pop_back();
    }

    /// Keeps the `len` segments nearest the head; never drops the head itself.
    pub fn truncate(&mut self, len: usize) {
        self.body.truncate(len.max(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: i32, y: i32) -> GridPosition {
        GridPosition::new(x, y)
    }

    #[test]
    fn test_from_segments_rejects_empty() {
        assert!(Snake::from_segments(vec![]).is_none());
        assert_eq!(Snake::from_segments(vec![p(1, 1)]).unwrap().len(), 1);
    }

    #[test]
    fn test_neck_is_second_segment() {
        assert_eq!(Snake::new(p(1, 1)).neck(), None);
        let snake = Snake::from_segments(vec![p(3, 0), p(2, 0), p(1, 0)]).unwrap();
        assert_eq!(snake.neck(), Some(p(2, 0)));
    }

    #[test]
    fn test_slither_keeps_length() {
        let mut snake = Snake::from_segments(vec![p(3, 0), p(2, 0), p(1, 0)]).unwrap();
        snake.slither_to(p(4, 0));
        assert_eq!(snake.to_vec(), vec![p(4, 0), p(3, 0), p(2, 0)]);
    }

    #[test]
    fn test_grow_keeps_tail() {
        let mut snake = Snake::new(p(20, 15));
        snake.grow_to(p(21, 15));
        assert_eq!(snake.to_vec(), vec![p(21, 15), p(20, 15)]);
        assert_eq!(snake.head(), p(21, 15));
    }

    #[test]
    fn test_collides_with_respects_skip() {
        let snake = Snake::from_segments(vec![p(5, 5), p(6, 5), p(5, 5)]).unwrap();
        assert!(snake.collides_with(p(5, 5), 0));
        assert!(snake.collides_with(p(5, 5), 1));
        assert!(snake.collides_with(p(6, 5), 1));
        assert!(!snake.collides_with(p(6, 5), 2));
        assert!(!snake.collides_with(p(7, 5), 0));
    }

    #[test]
    fn test_truncate_never_empties() {
        let mut snake = Snake::from_segments(vec![p(0, 0), p(1, 0), p(2, 0)]).unwrap();
        snake.truncate(0);
        assert_eq!(snake.to_vec(), vec![p(0, 0)]);
    }
}
