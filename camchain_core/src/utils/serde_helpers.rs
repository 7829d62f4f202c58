// camchain_core/src/utils/serde_helpers.rs

//! Serde adapters so sample and snapshot files can spell nalgebra types as
//! plain nested arrays.

pub mod points2_from_pairs {
    use nalgebra::Point2;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(points: &[Point2<f64>], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(points.iter().map(|p| [p.x, p.y]))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Point2<f64>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let pairs: Vec<[f64; 2]> = Deserialize::deserialize(deserializer)?;
        Ok(pairs.into_iter().map(|[u, v]| Point2::new(u, v)).collect())
    }
}

pub mod matrix3x4_from_rows {
    use nalgebra::Matrix3x4;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(m: &Matrix3x4<f64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let rows: Vec<[f64; 4]> = (0..3)
            .map(|r| [m[(r, 0)], m[(r, 1)], m[(r, 2)], m[(r, 3)]])
            .collect();
        serializer.collect_seq(rows.iter())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Matrix3x4<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let rows: [[f64; 4]; 3] = Deserialize::deserialize(deserializer)?;
        Ok(Matrix3x4::from_fn(|r, c| rows[r][c]))
    }
}
