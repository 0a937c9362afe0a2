//! Method resolution order computation.
//!
//! Python orders a class's ancestors using the C3 linearization.  We need the
//! same ordering because the tree parent of a class is its nearest ancestor
//! that is itself in the tree, and "nearest" is defined by this order.

/// C3 linearization of `head` given its declared `bases` and the (already
/// computed) linearization of each of those bases, in the same order.
///
/// Returns `None` when no consistent order exists, which is the case where
/// Python raises "Cannot create a consistent method resolution order".
pub fn c3_linearize<T: Copy + Eq>(head: T, bases: &[T], base_lins: &[Vec<T>]) -> Option<Vec<T>> {
    let mut result = vec![head];
    let mut seqs: Vec<Vec<T>> = base_lins.iter().cloned().collect();
    seqs.push(bases.to_vec());

    loop {
        seqs.retain(|seq| !seq.is_empty());
        if seqs.is_empty() {
            return Some(result);
        }

        // The first head that does not appear in the tail of any sequence.
        let candidate = seqs
            .iter()
            .map(|seq| seq[0])
            .find(|cand| !seqs.iter().any(|seq| seq[1..].contains(cand)))?;

        result.push(candidate);
        for seq in seqs.iter_mut() {
            if seq[0] == candidate {
                seq.remove(0);
            }
        }
    }
}

/// Fallback ordering for hierarchies C3 rejects: a depth-first, left-to-right
/// walk where each type is kept at its *last* occurrence.  This keeps shared
/// roots like `object` at the end of the chain.
pub fn depth_first_linearize<T: Copy + Eq>(head: T, base_lins: &[Vec<T>]) -> Vec<T> {
    let mut walk: Vec<T> = base_lins.iter().flatten().copied().collect();
    let mut kept = vec![];
    while let Some(item) = walk.pop() {
        if item != head && !kept.contains(&item) {
            kept.push(item);
        }
    }
    kept.push(head);
    kept.reverse();
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_inheritance() {
        // object <- A <- B
        let object = vec!['o'];
        let a = c3_linearize('a', &['o'], &[object]).unwrap();
        assert_eq!(a, vec!['a', 'o']);
        let b = c3_linearize('b', &['a'], &[a]).unwrap();
        assert_eq!(b, vec!['b', 'a', 'o']);
    }

    #[test]
    fn test_diamond() {
        // class A; class B(A); class C(A); class D(B, C)
        let a = vec!['a', 'o'];
        let b = c3_linearize('b', &['a'], &[a.clone()]).unwrap();
        let c = c3_linearize('c', &['a'], &[a]).unwrap();
        let d = c3_linearize('d', &['b', 'c'], &[b, c]).unwrap();
        assert_eq!(d, vec!['d', 'b', 'c', 'a', 'o']);
    }

    #[test]
    fn test_mixin_before_error_base() {
        // class M; class E(Exception); class X(M, E)
        let m = vec!['m', 'o'];
        let e = vec!['e', 'x', 'b', 'o'];
        let x = c3_linearize('X', &['m', 'e'], &[m, e]).unwrap();
        assert_eq!(x, vec!['X', 'm', 'e', 'x', 'b', 'o']);
    }

    #[test]
    fn test_inconsistent_order() {
        // class A; class B(A); class C(A, B) is rejected by Python.
        let a = vec!['a', 'o'];
        let b = vec!['b', 'a', 'o'];
        assert_eq!(c3_linearize('c', &['a', 'b'], &[a.clone(), b.clone()]), None);

        let fallback = depth_first_linearize('c', &[a, b]);
        assert_eq!(fallback, vec!['c', 'b', 'a', 'o']);
    }
}
