//! Class definition order.
//!
//! A class must follow its superclass and interfaces when they are defined
//! in the same container. Otherwise classes keep their commit order.

use std::collections::HashMap;

use crate::class::ClassRecord;
use crate::pool::TypeId;

/// Indices into `classes`, supertypes first.
pub(crate) fn class_order(classes: &[ClassRecord]) -> Vec<usize> {
    let by_type: HashMap<TypeId, usize> = classes
        .iter()
        .enumerate()
        .map(|(i, c)| (c.ty, i))
        .collect();

    let mut state = vec![Mark::Unvisited; classes.len()];
    let mut order = Vec::with_capacity(classes.len());
    for start in 0..classes.len() {
        visit(start, classes, &by_type, &mut state, &mut order);
    }
    order
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

fn visit(
    index: usize,
    classes: &[ClassRecord],
    by_type: &HashMap<TypeId, usize>,
    state: &mut [Mark],
    order: &mut Vec<usize>,
) {
    // cycles fall back to visit order
    if state[index] != Mark::Unvisited {
        return;
    }
    state[index] = Mark::InProgress;

    let class = &classes[index];
    let supertypes = class.super_ty.iter().chain(&class.interfaces);
    for ty in supertypes {
        if let Some(&dep) = by_type.get(ty) {
            visit(dep, classes, by_type, state, order);
        }
    }

    state[index] = Mark::Done;
    order.push(index);
}
