use fenris_topology::cell::{CellGeometry, CellOrientation, CellType};
use fenris_topology::mesh::procedural::create_unit_square_uniform_tri_mesh_2d;
use fenris_topology::proptest::{nondegenerate_triangle, point2};
use fenris_topology::MeshError;
use matrixcompare::assert_scalar_eq;
use nalgebra::{Point3, Vector3};
use proptest::prelude::*;

fn reference_triangle() -> [Point3<f64>; 3] {
    [Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)]
}

#[test]
fn entity_counts_match_known_values() {
    let expected: [(CellType, &[usize]); 5] = [
        (CellType::Interval, &[2, 1]),
        (CellType::Triangle, &[3, 3, 1]),
        (CellType::Quadrilateral, &[4, 4, 1]),
        (CellType::Tetrahedron, &[4, 6, 4, 1]),
        (CellType::Hexahedron, &[8, 12, 6, 1]),
    ];
    for (cell_type, counts) in expected {
        let actual: Vec<_> = (0..=cell_type.dim())
            .map(|d| cell_type.num_entities(d).unwrap())
            .collect();
        assert_eq!(actual, counts, "{}", cell_type);
    }
    assert!(CellType::Triangle.num_entities(3).is_err());
}

#[test]
fn triangle_edges_are_created_opposite_to_vertices() {
    let edges = CellType::Triangle.create_entities(1, &[7, 3, 5]).unwrap();
    assert_eq!(edges, vec![vec![3, 5], vec![7, 5], vec![7, 3]]);

    assert!(matches!(
        CellType::Triangle.create_entities(2, &[7, 3, 5]),
        Err(MeshError::IllegalDimension { dim: 2, tdim: 2, .. })
    ));
    assert!(matches!(
        CellType::Triangle.create_entities(1, &[7, 3]),
        Err(MeshError::MalformedInput(_))
    ));
}

#[test]
fn facet_types() {
    assert_eq!(CellType::Triangle.facet_type().unwrap(), CellType::Interval);
    assert_eq!(CellType::Hexahedron.facet_type().unwrap(), CellType::Quadrilateral);
    assert_eq!(CellType::Tetrahedron.entity_type(1).unwrap(), CellType::Interval);
    assert_eq!(CellType::Interval.facet_type().unwrap(), CellType::Point);
}

#[test]
fn reference_triangle_volume_and_diameter() {
    let p = reference_triangle();
    let triangle = CellGeometry::new(CellType::Triangle, 2, &p).unwrap();
    assert_scalar_eq!(triangle.volume().unwrap(), 0.5, comp = abs, tol = 1e-14);
    assert_scalar_eq!(triangle.diameter().unwrap(), 2.0f64.sqrt(), comp = abs, tol = 1e-14);
    assert_scalar_eq!(triangle.facet_area(0).unwrap(), 2.0f64.sqrt(), comp = abs, tol = 1e-14);
    assert_scalar_eq!(triangle.facet_area(2).unwrap(), 1.0, comp = abs, tol = 1e-14);
    assert!(triangle.facet_area(3).is_err());
}

#[test]
fn reference_triangle_containment_and_distance() {
    let p = reference_triangle();
    let triangle = CellGeometry::new(CellType::Triangle, 2, &p).unwrap();
    assert!(triangle.contains(&Point3::new(0.25, 0.25, 0.0)).unwrap());
    assert!(!triangle.contains(&Point3::new(1.0, 1.0, 0.0)).unwrap());
    assert_scalar_eq!(
        triangle
            .squared_distance(&Point3::new(2.0, 0.0, 0.0))
            .unwrap(),
        1.0,
        comp = abs,
        tol = 1e-14
    );
    assert_scalar_eq!(
        triangle
            .squared_distance(&Point3::new(0.25, 0.25, 0.0))
            .unwrap(),
        0.0,
        comp = abs,
        tol = 1e-14
    );
}

#[test]
fn equilateral_triangle_has_unit_radius_ratio() {
    let p = [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.5, 0.75f64.sqrt(), 0.0),
    ];
    let triangle = CellGeometry::new(CellType::Triangle, 2, &p).unwrap();
    assert_scalar_eq!(triangle.radius_ratio().unwrap(), 1.0, comp = abs, tol = 1e-12);
    assert_scalar_eq!(triangle.inradius().unwrap(), 3.0f64.sqrt() / 6.0, comp = abs, tol = 1e-12);
}

#[test]
fn degenerate_triangle() {
    let p = [Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0)];
    let triangle = CellGeometry::new(CellType::Triangle, 2, &p).unwrap();
    assert_eq!(triangle.volume().unwrap(), 0.0);
    assert_eq!(triangle.radius_ratio().unwrap(), 0.0);
    assert!(matches!(
        triangle.diameter(),
        Err(MeshError::DegenerateEntity {
            cell_type: CellType::Triangle,
            ..
        })
    ));
}

#[test]
fn tensor_cells_are_not_simplices() {
    let p = [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
    ];
    let quad = CellGeometry::new(CellType::Quadrilateral, 2, &p).unwrap();
    assert_scalar_eq!(quad.volume().unwrap(), 1.0, comp = abs, tol = 1e-14);
    assert_scalar_eq!(quad.diameter().unwrap(), 2.0f64.sqrt(), comp = abs, tol = 1e-14);
    assert!(matches!(
        quad.radius_ratio(),
        Err(MeshError::UnsupportedCellType { .. })
    ));
    assert!(CellGeometry::new(CellType::Quadrilateral, 2, &p[..3]).is_err());
}

#[test]
fn orientation_of_embedded_triangle() {
    let p = reference_triangle();
    let triangle = CellGeometry::new(CellType::Triangle, 3, &p).unwrap();
    assert_eq!(triangle.cell_normal().unwrap(), Vector3::new(0.0, 0.0, 1.0));
    assert_eq!(
        triangle.orientation(&Vector3::new(0.0, 0.0, 1.0)).unwrap(),
        CellOrientation::Aligned
    );
    assert_eq!(
        triangle.orientation(&Vector3::new(0.0, 0.0, -1.0)).unwrap(),
        CellOrientation::Flipped
    );
}

#[test]
fn normals_of_mesh_cells_point_outward() {
    let mesh = create_unit_square_uniform_tri_mesh_2d::<f64>(2).unwrap();
    for cell in mesh.cells() {
        let midpoint = cell.midpoint().unwrap();
        let facets = cell.entities(1).unwrap();
        for (local, &facet) in facets.iter().enumerate() {
            let facet_midpoint = mesh.entity(1, facet).unwrap().midpoint().unwrap();
            let n = cell.normal(local).unwrap();
            assert!(n.dot(&(facet_midpoint - midpoint)) > 0.0);
            assert_scalar_eq!(n.norm(), 1.0, comp = abs, tol = 1e-14);
        }
    }
}

proptest! {
    #[test]
    fn contained_points_have_zero_distance(triangle in nondegenerate_triangle(), p in point2()) {
        let geometry = CellGeometry::new(CellType::Triangle, 2, &triangle).unwrap();
        let p = Point3::new(p.x, p.y, 0.0);
        let squared_distance = geometry.squared_distance(&p).unwrap();
        if geometry.contains(&p).unwrap() {
            prop_assert!(squared_distance <= 1e-12);
        } else {
            prop_assert!(squared_distance > 0.0);
        }
    }

    #[test]
    fn vertices_and_midpoint_are_contained(triangle in nondegenerate_triangle()) {
        let geometry = CellGeometry::new(CellType::Triangle, 2, &triangle).unwrap();
        prop_assert!(geometry.contains(&geometry.midpoint()).unwrap());
        prop_assert!(geometry.radius_ratio().unwrap() > 0.0);
        prop_assert!(geometry.radius_ratio().unwrap() <= 1.0 + 1e-9);
    }
}
