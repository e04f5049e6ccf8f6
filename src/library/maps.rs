use super::Library;
use crate::evaluator;
use crate::types::{Arity, IodeMap, IodeObject, PrimitiveFn};
use itertools::Itertools;

// Maps are values: every operation here builds a new map and leaves its
// arguments alone.

const HASHMAP: PrimitiveFn = PrimitiveFn {
    name: "hashmap",
    fn_ptr: hashmap_,
    arity: Arity::Even,
};

fn hashmap_(args: &[IodeObject]) -> evaluator::Result {
    let mut map = IodeMap::default();
    for (key, value) in args.iter().tuples() {
        map.assoc(key.clone(), value.clone());
    }
    Ok(IodeObject::wrap_map(map))
}

const GET: PrimitiveFn = PrimitiveFn {
    name: "get",
    fn_ptr: get_,
    arity: Arity::exactly(2),
};

fn get_(args: &[IodeObject]) -> evaluator::Result {
    let map = args[0].as_map()?;
    Ok(map.lookup(&args[1]).cloned().unwrap_or(IodeObject::Nil))
}

const KEYS: PrimitiveFn = PrimitiveFn {
    name: "keys",
    fn_ptr: |args| {
        let keys = args[0].as_map()?.iter().map(|(k, _)| k.clone()).collect();
        Ok(IodeObject::wrap_list(keys))
    },
    arity: Arity::exactly(1),
};

const VALUES: PrimitiveFn = PrimitiveFn {
    name: "values",
    fn_ptr: |args| {
        let values = args[0].as_map()?.iter().map(|(_, v)| v.clone()).collect();
        Ok(IodeObject::wrap_list(values))
    },
    arity: Arity::exactly(1),
};

const ASSOC: PrimitiveFn = PrimitiveFn {
    name: "assoc",
    fn_ptr: assoc_,
    arity: Arity::exactly(3),
};

fn assoc_(args: &[IodeObject]) -> evaluator::Result {
    let mut map = args[0].as_map()?.clone();
    map.assoc(args[1].clone(), args[2].clone());
    Ok(IodeObject::wrap_map(map))
}

const MERGE: PrimitiveFn = PrimitiveFn {
    name: "merge",
    fn_ptr: merge_,
    arity: Arity::at_least(0),
};

/// Later maps win where keys collide.
fn merge_(args: &[IodeObject]) -> evaluator::Result {
    let mut merged = IodeMap::default();
    for arg in args {
        merged.merge(arg.as_map()?);
    }
    Ok(IodeObject::wrap_map(merged))
}

const DISSOC: PrimitiveFn = PrimitiveFn {
    name: "dissoc",
    fn_ptr: dissoc_,
    arity: Arity::exactly(2),
};

fn dissoc_(args: &[IodeObject]) -> evaluator::Result {
    let mut map = args[0].as_map()?.clone();
    map.dissoc(&args[1]);
    Ok(IodeObject::wrap_map(map))
}

pub static LIBRARY: Library = Library {
    name: "maps",
    functions: &[&HASHMAP, &GET, &KEYS, &VALUES, &ASSOC, &MERGE, &DISSOC],
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::{call_primitive, Error};

    fn map_of(pairs: &[(&str, i64)]) -> IodeObject {
        let args: Vec<IodeObject> = pairs
            .iter()
            .flat_map(|&(k, v)| vec![IodeObject::from(k), IodeObject::Integer(v)])
            .collect();
        call_primitive(&HASHMAP, &args).unwrap()
    }

    #[test]
    fn hashmap_needs_pairs() {
        assert!(matches!(
            call_primitive(&HASHMAP, &[IodeObject::Nil]),
            Err(Error::ArityMismatch(_))
        ));
        assert_eq!(call_primitive(&HASHMAP, &[]).unwrap(), map_of(&[]));
    }

    #[test]
    fn lookup() {
        let map = map_of(&[("a", 1), ("b", 2)]);
        assert_eq!(call_primitive(&GET, &[map.clone(), "b".into()]).unwrap(), IodeObject::Integer(2));
        assert_eq!(call_primitive(&GET, &[map.clone(), "z".into()]).unwrap(), IodeObject::Nil);
        assert_eq!(
            call_primitive(&KEYS, &[map.clone()]).unwrap(),
            IodeObject::from(vec![IodeObject::from("a"), IodeObject::from("b")])
        );
        assert_eq!(
            call_primitive(&VALUES, &[map]).unwrap(),
            IodeObject::from(vec![IodeObject::Integer(1), IodeObject::Integer(2)])
        );
    }

    #[test]
    fn updates_leave_the_original_alone() {
        let map = map_of(&[("a", 1)]);
        let updated = call_primitive(&ASSOC, &[map.clone(), "a".into(), IodeObject::Integer(5)]).unwrap();
        assert_eq!(updated, map_of(&[("a", 5)]));
        assert_eq!(map, map_of(&[("a", 1)]));

        let removed = call_primitive(&DISSOC, &[updated, "a".into()]).unwrap();
        assert_eq!(removed, map_of(&[]));
    }

    #[test]
    fn merge_prefers_later_maps() {
        let merged = call_primitive(
            &MERGE,
            &[map_of(&[("a", 1), ("b", 2)]), map_of(&[("b", 3), ("c", 4)])],
        )
        .unwrap();
        assert_eq!(merged, map_of(&[("a", 1), ("b", 3), ("c", 4)]));
    }
}
