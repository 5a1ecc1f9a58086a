use crate::mesh::Mesh;
use crate::{MeshError, Real};
use log::trace;

impl<T: Real> Mesh<T> {
    /// Colors the cells so that no two cells of the same color share an entity of any of the
    /// given dimensions.
    ///
    /// Cells are colored greedily in ascending order: each color takes every remaining cell
    /// that does not touch an entity already claimed by that color. The result only depends on
    /// the topology. Returns the color of every cell.
    pub fn color(&self, dims: &[usize]) -> Result<Vec<usize>, MeshError> {
        let tdim = self.dim();
        let num_cells = self.num_cells();

        // Entities of all requested dimensions share one index space
        let mut tables = Vec::with_capacity(dims.len());
        let mut offset = 0;
        for &dim in dims {
            let n = self.topology().init(dim)?;
            tables.push((offset, self.topology().connectivity(tdim, dim)?));
            offset += n;
        }
        let cell_entities = |cell: usize| {
            tables
                .iter()
                .flat_map(move |(offset, table)| table.row(cell).iter().map(move |&e| offset + e))
        };

        let mut colors = vec![0; num_cells];
        let mut last_visited_color: Vec<Option<usize>> = vec![None; offset];
        let mut remaining: Vec<usize> = (0..num_cells).collect();
        let mut postponed = Vec::new();
        let mut color = 0;
        while !remaining.is_empty() {
            for &cell in &remaining {
                let is_blocked = cell_entities(cell).any(|e| last_visited_color[e] == Some(color));
                if is_blocked {
                    postponed.push(cell);
                } else {
                    for e in cell_entities(cell) {
                        last_visited_color[e] = Some(color);
                    }
                    colors[cell] = color;
                }
            }
            std::mem::swap(&mut remaining, &mut postponed);
            postponed.clear();
            color += 1;
        }
        trace!("Colored {} cells with {} colors", num_cells, color);
        Ok(colors)
    }

    /// Cells grouped by color, see [`color`](Self::color).
    pub fn cells_by_color(&self, dims: &[usize]) -> Result<Vec<Vec<usize>>, MeshError> {
        let colors = self.color(dims)?;
        let num_colors = colors.iter().max().map_or(0, |&c| c + 1);
        let mut groups = vec![Vec::new(); num_colors];
        for (cell, &color) in colors.iter().enumerate() {
            groups[color].push(cell);
        }
        Ok(groups)
    }
}
