use log::{debug, info};
use zdom::{Document, ElementId};

use crate::{error::SqError, square::SquarePos, SqResult};

pub const CONTAINER_CLASS: &str = "game-div";
pub const BLACK_SQUARE_CLASS: &str = "black-square";
pub const WHITE_SQUARE_CLASS: &str = "white-square";
pub const MARKER_CLASS: &str = "marker";

#[derive(Clone, Debug)]
struct MarkerInfo {
    at: SquarePos,
    targets: Vec<SquarePos>,
}

/// A `size` x `size` grid of square elements with `row,col` ids.
///
/// Squares are looked up by id among the container's children on every
/// access: the binder may swap them for fresh copies at any time.
///
/// Markers are plain child elements of a square. Their `move-<row>-<col>`
/// classes name the squares they relate to, so the hover rule picks them up.
#[derive(Debug)]
pub struct Board {
    container: ElementId,
    size: i32,
    square_class: String,
    markers: Vec<MarkerInfo>,
}

impl Board {
    pub fn render(
        doc: &mut Document,
        parent: ElementId,
        size: i32,
        square_class: &str,
    ) -> SqResult<Self> {
        let container = doc.create_element("div");
        doc.add_class(container, CONTAINER_CLASS)?;
        doc.append_child(parent, container)?;
        let mut board = Self {
            container,
            size,
            square_class: square_class.to_string(),
            markers: Vec::new(),
        };
        board.render_squares(doc)?;
        info!("Board: rendered {}x{}", size, size);
        Ok(board)
    }

    fn render_squares(&mut self, doc: &mut Document) -> SqResult {
        for pos in positions(self.size) {
            let square = doc.create_element("div");
            doc.set_id(square, &pos.to_string())?;
            doc.add_class(square, &self.square_class)?;
            doc.add_class(square, square_color_class(pos))?;
            doc.append_child(self.container, square)?;
        }
        for marker in self.markers.clone() {
            self.create_marker(doc, &marker)?;
        }
        Ok(())
    }

    /// Destroys every square element and builds new ones.
    ///
    /// Listeners attached to the old squares go away with them, so the
    /// binder has to be run again afterwards.
    pub fn rerender(&mut self, doc: &mut Document) -> SqResult {
        for square in doc.children(self.container).to_vec() {
            doc.remove_child(self.container, square)?;
        }
        self.render_squares(doc)?;
        debug!("Board: rerendered");
        Ok(())
    }

    pub fn add_marker(
        &mut self,
        doc: &mut Document,
        at: SquarePos,
        targets: &[SquarePos],
    ) -> SqResult<ElementId> {
        let marker = MarkerInfo {
            at,
            targets: targets.to_vec(),
        };
        let el = self.create_marker(doc, &marker)?;
        self.markers.push(marker);
        Ok(el)
    }

    fn create_marker(&self, doc: &mut Document, marker: &MarkerInfo) -> SqResult<ElementId> {
        let square = self.square_or_err(doc, marker.at)?;
        let el = doc.create_element("div");
        doc.add_class(el, MARKER_CLASS)?;
        for target in &marker.targets {
            doc.add_class(el, &target.move_class())?;
        }
        doc.append_child(square, el)?;
        Ok(el)
    }

    pub fn clear_markers(&mut self, doc: &mut Document) -> SqResult {
        for pos in positions(self.size) {
            let square = match self.square(doc, pos) {
                Some(square) => square,
                None => continue,
            };
            for child in doc.children(square).to_vec() {
                if doc.has_class(child, MARKER_CLASS) {
                    doc.remove_child(square, child)?;
                }
            }
        }
        self.markers.clear();
        Ok(())
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    pub fn contains(&self, pos: SquarePos) -> bool {
        (0..self.size).contains(&pos.row) && (0..self.size).contains(&pos.col)
    }

    pub fn square(&self, doc: &Document, pos: SquarePos) -> Option<ElementId> {
        if !self.contains(pos) {
            return None;
        }
        let id = pos.to_string();
        doc.children(self.container)
            .iter()
            .copied()
            .find(|&el| doc.id(el) == Some(id.as_str()))
    }

    fn square_or_err(&self, doc: &Document, pos: SquarePos) -> SqResult<ElementId> {
        self.square(doc, pos)
            .ok_or_else(|| SqError::MissingElement { id: pos.to_string() })
    }

    /// Markers currently placed on the square at `pos`.
    pub fn markers_at(&self, doc: &Document, pos: SquarePos) -> Vec<ElementId> {
        match self.square(doc, pos) {
            Some(square) => doc
                .children(square)
                .iter()
                .copied()
                .filter(|&el| doc.has_class(el, MARKER_CLASS))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Maps a point in board-local pixels to a square.
    pub fn pos_at(&self, x: f32, y: f32, cell_size: f32) -> Option<SquarePos> {
        if x < 0.0 || y < 0.0 || cell_size <= 0.0 {
            return None;
        }
        let row = (y / cell_size) as i32;
        let col = (x / cell_size) as i32;
        if row < self.size && col < self.size {
            Some(SquarePos::new(row, col))
        } else {
            None
        }
    }
}

/// Every position of a `size` x `size` board, row by row.
pub fn positions(size: i32) -> impl Iterator<Item = SquarePos> {
    (0..size).flat_map(move |row| (0..size).map(move |col| SquarePos::new(row, col)))
}

pub fn square_color_class(pos: SquarePos) -> &'static str {
    if (pos.row + pos.col) % 2 == 0 {
        BLACK_SQUARE_CLASS
    } else {
        WHITE_SQUARE_CLASS
    }
}
