use slime_geom::{Direction, Point};

/// Clockwise square spiral over the chunks of a `outer_width`² square around
/// `center`, skipping the `inner_width`² square in the middle.
///
/// The first `step` yields the start point. Once the outer square is
/// exhausted `step` returns `None` and the path rewinds itself, so the next
/// `step` starts an identical traversal.
#[derive(Clone, Debug)]
pub struct SearchPath {
    center: Point,
    inner_width: i32,
    outer_width: i32,
    edge_length: i32,
    steps_on_edge: i32,
    turns_since_growth: u8,
    direction: Direction,
    point: Point,
    started: bool,
    steps_taken: u64,
}

impl SearchPath {
    pub fn new(center: Point, inner_width: i32, outer_width: i32) -> Self {
        let mut path = Self {
            center,
            inner_width: inner_width.max(0),
            outer_width: outer_width.max(0),
            edge_length: 0,
            steps_on_edge: 0,
            turns_since_growth: 0,
            direction: Direction::East,
            point: center,
            started: false,
            steps_taken: 0,
        };
        path.reset();
        path
    }

    /// Rewinds to the state before the first step.
    pub fn reset(&mut self) {
        self.steps_taken = 0;
        self.steps_on_edge = 0;
        self.started = false;
        let w = self.inner_width;
        let (dx, dz) = if w <= 0 {
            self.direction = Direction::East;
            self.edge_length = 1;
            self.turns_since_growth = 0;
            (0, 0)
        } else {
            self.edge_length = w;
            self.turns_since_growth = 1;
            if w % 2 == 0 {
                self.direction = Direction::North;
                (-w / 2, w / 2)
            } else {
                self.direction = Direction::South;
                ((w + 1) / 2, -(w - 1) / 2)
            }
        };
        self.point = Point::new(self.center.x + dx, self.center.z + dz);
    }

    /// Next chunk on the path, or `None` once the search area is left.
    pub fn step(&mut self) -> Option<Point> {
        if self.path_length() == 0 {
            return None;
        }
        if !self.started {
            self.started = true;
            self.steps_taken = 1;
            return Some(self.point);
        }

        self.point = self.point.step(self.direction, 1);
        self.steps_on_edge += 1;
        if self.steps_on_edge >= self.edge_length {
            if self.edge_length >= self.outer_width {
                self.reset();
                return None;
            }
            self.steps_on_edge = 0;
            self.direction = self.direction.clockwise();
            self.turns_since_growth += 1;
            if self.turns_since_growth > 1 {
                self.turns_since_growth = 0;
                self.edge_length += 1;
            }
        }
        self.steps_taken += 1;
        Some(self.point)
    }

    /// Current point, `None` before the first step.
    #[inline]
    pub fn point(&self) -> Option<Point> {
        self.started.then_some(self.point)
    }

    /// Points yielded since the last rewind.
    #[inline]
    pub fn progress(&self) -> u64 {
        self.steps_taken
    }

    /// Number of distinct chunks one traversal visits.
    #[inline]
    pub fn path_length(&self) -> u64 {
        let outer = i64::from(self.outer_width);
        let inner = i64::from(self.inner_width);
        (outer * outer - inner * inner).max(0) as u64
    }

    #[inline]
    pub fn center(&self) -> Point {
        self.center
    }
}
