use ndarray::prelude::*;
use ndarray::*;
use num_traits::Float;

pub trait Array1Float<T: Float> {
    /// Along a 1D array, return the maximum float value and its index
    ///
    /// If there are multiple equal maximum values, the first one is returned with its index. This
    /// includes the case where every value is negative infinity.
    ///
    /// The behavior of this function is unspecified if the array contains NaNs.
    fn maxf(&self) -> Option<(usize, T)>;
}

pub trait Array1FloatMut {
    /// Divide every element by the sum of the elements, returning that sum. Returns `None` and
    /// leaves the array untouched if the sum is not positive.
    fn nip(&mut self) -> Option<f64>;
}

#[cfg(test)]
pub trait Array2FloatMut {
    fn nip_rows(&mut self);

    fn normalize_rows(self) -> Self;
}

impl<T, S> Array1Float<T> for ArrayBase<S, Ix1>
where
    T: Float,
    S: Data<Elem = T>,
{
    fn maxf(&self) -> Option<(usize, T)> {
        self.iter()
            .enumerate()
            .reduce(|(i0, v0), (i1, v1)| if v1 > v0 { (i1, v1) } else { (i0, v0) })
            .map(|(i, &v)| (i, v))
    }
}

impl<S> Array1FloatMut for ArrayBase<S, Ix1>
where
    S: DataMut + Data<Elem = f64>,
{
    fn nip(&mut self) -> Option<f64> {
        let sum: f64 = self.sum();
        if sum > 0.0 && sum.is_finite() {
            (*self) /= sum;
            Some(sum)
        } else {
            None
        }
    }
}

#[cfg(test)]
impl<S> Array2FloatMut for ArrayBase<S, Ix2>
where
    S: DataMut + Data<Elem = f64>,
{
    fn nip_rows(&mut self) {
        for mut row in self.rows_mut() {
            let sum: f64 = row.sum();
            assert!(sum > 0.0);
            row /= sum;
        }
    }

    fn normalize_rows(mut self) -> Self {
        self.nip_rows();
        self
    }
}
