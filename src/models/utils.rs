use std::collections::HashMap;
use std::hash::Hash;

use grb::prelude::*;

/// Trait that converts gurobi variables to f64
pub trait ConvertVars {
    type Out;
    fn convert(&self, model: &Model) -> grb::Result<Self::Out>;
}

impl ConvertVars for Var {
    type Out = f64;

    fn convert(&self, model: &Model) -> grb::Result<Self::Out> {
        model.get_obj_attr(attr::X, self)
    }
}

impl<T: ConvertVars> ConvertVars for Vec<T> {
    type Out = Vec<T::Out>;

    fn convert(&self, model: &Model) -> grb::Result<Self::Out> {
        let mut out = Vec::with_capacity(self.len());
        for e in self {
            out.push(e.convert(model)?);
        }
        Ok(out)
    }
}

impl<K: Clone + Eq + Hash, T: ConvertVars> ConvertVars for HashMap<K, T> {
    type Out = HashMap<K, T::Out>;

    fn convert(&self, model: &Model) -> grb::Result<Self::Out> {
        let mut out = HashMap::with_capacity(self.len());
        for (k, e) in self {
            out.insert(k.clone(), e.convert(model)?);
        }
        Ok(out)
    }
}
