//! Loop detection over the recent head positions of a live game.

use crate::game::Point;

/// Number of head positions inspected at once, about 8x the shortest snake.
pub const CYCLE_WINDOW: usize = 32;

/// Shortest period reported; a single repeated cell is a stalled head, not a loop.
pub const MIN_CYCLE_PERIOD: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cycle {
    pub start: usize,
    pub period: usize,
}

/// Floyd's tortoise and hare over `visited`.
///
/// The reported period is the tortoise index where the two first meet, so it is
/// a multiple of the smallest period; `start` is the first index from which
/// `visited` repeats with that period.
pub fn detect_cycle(visited: &[Point]) -> Option<Cycle> {
    if visited.len() < CYCLE_WINDOW {
        return None;
    }

    let mut tortoise = 1;
    let mut hare = 2;
    while visited[tortoise] != visited[hare] && hare < visited.len() - 2 {
        tortoise += 1;
        hare += 2;
    }

    if visited[tortoise] != visited[hare] || tortoise < MIN_CYCLE_PERIOD {
        return None;
    }
    let period = tortoise;

    let start = (0..visited.len() - period).find(|&i| visited[i] == visited[i + period])?;
    Some(Cycle { start, period })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(cols: &[i32]) -> Vec<Point> {
        cols.iter().map(|&col| Point::new(0, col)).collect()
    }

    fn repeat(prefix: &[i32], pattern: &[i32], len: usize) -> Vec<Point> {
        let cols: Vec<i32> = prefix.iter().chain(pattern.iter().cycle()).take(len).copied().collect();
        points(&cols)
    }

    #[test]
    fn test_short_logs_have_no_cycle() {
        assert_eq!(detect_cycle(&[]), None);
        assert_eq!(detect_cycle(&points(&[0, 1, 2])), None);
        assert_eq!(detect_cycle(&repeat(&[], &[0, 1], 31)), None);
    }

    #[test]
    fn test_alternating_two_cycle() {
        let cycle = detect_cycle(&repeat(&[], &[0, 1], 32));
        assert_eq!(cycle, Some(Cycle { start: 0, period: 2 }));
    }

    #[test]
    fn test_cycle_after_prefix() {
        let cycle = detect_cycle(&repeat(&[0, 1], &[2, 3, 4], 40));
        assert_eq!(cycle, Some(Cycle { start: 2, period: 3 }));
    }

    #[test]
    fn test_square_loop() {
        let visited: Vec<Point> = [(0, 0), (0, 1), (1, 1), (1, 0)]
            .iter()
            .cycle()
            .take(48)
            .map(|&(r, c)| Point::new(r, c))
            .collect();

        assert_eq!(detect_cycle(&visited), Some(Cycle { start: 0, period: 4 }));
    }

    #[test]
    fn test_straight_path_has_no_cycle() {
        let visited: Vec<i32> = (0..40).collect();
        assert_eq!(detect_cycle(&points(&visited)), None);
    }

    #[test]
    fn test_stalled_head_is_not_a_cycle() {
        assert_eq!(detect_cycle(&repeat(&[], &[7], 32)), None);
    }
}
