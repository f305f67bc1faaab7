//! Reduced ordered BDD manager with complement edges.
//!
//! All functions live in one manager, which hash-conses nodes in a bounded
//! unique table and memoizes ITE results in a computed table. Variables are
//! 1-indexed and ordered by index: variable `1` is the topmost.
//!
//! Operations that create nodes are fallible: once the unique table is full
//! they return [`StorageFull`] instead of growing without bound, so callers can
//! report a blow-up as such.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt::Debug;

use log::debug;

use crate::cache::Cache;
use crate::reference::Ref;
use crate::table::{StorageFull, Table};
use crate::utils::{pairing3, MyHash};

pub type BddResult<T> = Result<T, StorageFull>;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
struct Node {
    variable: u32,
    low: Ref,
    high: Ref,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            variable: 0,
            low: Ref::new(0),
            high: Ref::new(0),
        }
    }
}

impl MyHash for Node {
    fn hash(&self) -> u64 {
        pairing3(
            self.variable as u64,
            self.low.unsigned() as u64,
            self.high.unsigned() as u64,
        )
    }
}

type Storage = Table<Node>;

#[derive(Debug, Eq, PartialEq, Clone)]
pub enum OpKey {
    Ite(Ref, Ref, Ref),
}

impl MyHash for OpKey {
    fn hash(&self) -> u64 {
        match self {
            OpKey::Ite(f, g, h) => pairing3(
                f.unsigned() as u64,
                g.unsigned() as u64,
                h.unsigned() as u64,
            ),
        }
    }
}

pub struct Bdd {
    storage: RefCell<Storage>,
    cache: RefCell<Cache<OpKey, Ref>>,
    zero: Ref,
    one: Ref,
}

impl Bdd {
    /// Create a manager whose unique table holds `2^storage_bits` cells.
    pub fn new(storage_bits: usize) -> Self {
        assert!(
            (1..=31).contains(&storage_bits),
            "Storage bits should be in the range 1..=31"
        );

        let cache_bits = storage_bits.min(16);

        let mut storage = Storage::new(storage_bits);

        // Allocate the terminal node:
        let one = storage
            .alloc()
            .expect("a table of two or more cells fits the terminal");
        assert_eq!(one, 1); // Make sure the terminal node is (1).
        let one = Ref::positive(one as u32);
        let zero = -one;

        Self {
            storage: RefCell::new(storage),
            cache: RefCell::new(Cache::new(cache_bits)),
            zero,
            one,
        }
    }
}

impl Default for Bdd {
    fn default() -> Self {
        Bdd::new(20)
    }
}

impl Debug for Bdd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let storage = self.storage.borrow();
        f.debug_struct("Bdd")
            .field("capacity", &storage.capacity())
            .field("size", &storage.size())
            .finish()
    }
}

impl Bdd {
    pub fn zero(&self) -> Ref {
        self.zero
    }
    pub fn one(&self) -> Ref {
        self.one
    }

    /// Constant function for a Boolean value.
    pub fn constant(&self, value: bool) -> Ref {
        if value {
            self.one
        } else {
            self.zero
        }
    }

    pub fn cache(&self) -> std::cell::Ref<'_, Cache<OpKey, Ref>> {
        self.cache.borrow()
    }

    /// Number of allocated nodes, the terminal included.
    pub fn num_nodes(&self) -> usize {
        self.storage.borrow().size()
    }

    pub fn capacity(&self) -> usize {
        self.storage.borrow().capacity()
    }

    pub fn variable(&self, index: usize) -> u32 {
        self.storage.borrow().value(index).variable
    }
    pub fn low(&self, index: usize) -> Ref {
        self.storage.borrow().value(index).low
    }
    pub fn high(&self, index: usize) -> Ref {
        self.storage.borrow().value(index).high
    }

    pub fn low_node(&self, node: Ref) -> Ref {
        let low = self.low(node.index());
        if node.is_negated() {
            -low
        } else {
            low
        }
    }
    pub fn high_node(&self, node: Ref) -> Ref {
        let high = self.high(node.index());
        if node.is_negated() {
            -high
        } else {
            high
        }
    }

    pub fn is_zero(&self, node: Ref) -> bool {
        node == self.zero
    }
    pub fn is_one(&self, node: Ref) -> bool {
        node == self.one
    }
    pub fn is_terminal(&self, node: Ref) -> bool {
        self.is_zero(node) || self.is_one(node)
    }

    pub fn mk_node(&self, v: u32, low: Ref, high: Ref) -> BddResult<Ref> {
        debug!("mk(v = {}, low = {}, high = {})", v, low, high);

        assert_ne!(v, 0, "Variable index should not be zero");

        // Handle canonicity
        if high.is_negated() {
            debug!("mk: restoring canonicity");
            return Ok(-self.mk_node(v, -low, -high)?);
        }

        // Handle duplicates
        if low == high {
            debug!("mk: duplicates {} == {}", low, high);
            return Ok(low);
        }

        let i = self.storage.borrow_mut().put(Node {
            variable: v,
            low,
            high,
        })?;
        Ok(Ref::positive(i as u32))
    }

    pub fn mk_var(&self, v: u32) -> BddResult<Ref> {
        assert_ne!(v, 0, "Variable index should not be zero");
        self.mk_node(v, self.zero, self.one)
    }

    /// Conjunction of DIMACS-style literals.
    pub fn mk_cube(&self, literals: impl IntoIterator<Item = i32>) -> BddResult<Ref> {
        let mut literals = literals.into_iter().collect::<Vec<_>>();
        literals.sort_by_key(|&v| v.abs());
        debug!("cube(literals = {:?})", literals);
        literals.reverse();
        let mut current = self.one;
        for lit in literals {
            assert_ne!(lit, 0, "Variable index should not be zero");
            current = if lit < 0 {
                self.mk_node(lit.unsigned_abs(), current, self.zero)?
            } else {
                self.mk_node(lit as u32, self.zero, current)?
            };
        }
        Ok(current)
    }

    pub fn top_cofactors(&self, node: Ref, v: u32) -> (Ref, Ref) {
        assert_ne!(v, 0, "Variable index should not be zero");

        let i = node.index();
        if self.is_terminal(node) || v < self.variable(i) {
            return (node, node);
        }
        assert_eq!(v, self.variable(i));
        if node.is_negated() {
            (-self.low(i), -self.high(i))
        } else {
            (self.low(i), self.high(i))
        }
    }

    /// Apply the ITE operation to the arguments.
    ///
    /// ```text
    /// ITE(x, y, z) = (x ∧ y) ∨ (¬x ∧ z)
    /// ```
    ///
    /// # Examples
    ///
    /// ```
    /// use lsv_rs::bdd::Bdd;
    ///
    /// let bdd = Bdd::default();
    /// let x = bdd.mk_var(1).unwrap();
    /// let y = bdd.mk_var(2).unwrap();
    /// let z = bdd.mk_var(3).unwrap();
    /// let f = bdd.apply_ite(x, y, z).unwrap();
    /// let x_and_y = bdd.apply_and(x, y).unwrap();
    /// let not_x_and_z = bdd.apply_and(-x, z).unwrap();
    /// assert_eq!(f, bdd.apply_or(x_and_y, not_x_and_z).unwrap());
    /// ```
    pub fn apply_ite(&self, f: Ref, g: Ref, h: Ref) -> BddResult<Ref> {
        debug!("apply_ite(f = {}, g = {}, h = {})", f, g, h);

        // Base cases:
        //   ite(1,G,H) => G
        //   ite(0,G,H) => H
        if self.is_one(f) {
            return Ok(g);
        }
        if self.is_zero(f) {
            return Ok(h);
        }

        // From now on, F is known not to be a constant
        assert!(!self.is_terminal(f));

        // More base cases:
        //   ite(F,G,G) => G
        //   ite(F,1,0) => F
        //   ite(F,0,1) => ~F
        //   ite(F,1,~F) => 1
        //   ite(F,F,1) => 1
        //   ite(F,~F,0) => 0
        //   ite(F,0,F) => F
        if g == h {
            return Ok(g);
        }
        if self.is_one(g) && self.is_zero(h) {
            return Ok(f);
        }
        if self.is_zero(g) && self.is_one(h) {
            return Ok(-f);
        }
        if self.is_one(g) && h == -f {
            return Ok(self.one);
        }
        if g == f && self.is_one(h) {
            return Ok(self.one);
        }
        if g == -f && self.is_zero(h) {
            return Ok(self.zero);
        }
        if self.is_zero(g) && h == f {
            return Ok(f);
        }

        // Standard triples:
        //   ite(F,F,H) => ite(F,1,H)
        //   ite(F,G,F) => ite(F,G,0)
        //   ite(F,~F,H) => ite(F,0,H)
        //   ite(F,G,~F) => ite(F,G,1)
        if g == f {
            return self.apply_ite(f, self.one, h);
        }
        if h == f {
            return self.apply_ite(f, g, self.zero);
        }
        if g == -f {
            return self.apply_ite(f, self.zero, h);
        }
        if h == -f {
            return self.apply_ite(f, g, self.one);
        }

        let i = self.variable(f.index());
        let j = self.variable(g.index());
        let k = self.variable(h.index());
        assert_ne!(i, 0);

        // Equivalent pairs (choose the one with the lowest top variable):
        //   ite(F,1,H) == ite(H,1,F) == F ∨ H
        //   ite(F,G,0) == ite(G,F,0) == F ∧ G
        //   ite(F,G,1) == ite(~G,~F,1) == F -> G
        //   ite(F,0,H) == ite(~H,0,~F) == ~F ∧ H
        //   ite(F,G,~G) == ite(G,F,~F)
        if self.is_one(g) && k < i {
            return self.apply_ite(h, self.one, f);
        }
        if self.is_zero(h) && j < i {
            return self.apply_ite(g, f, self.zero);
        }
        if self.is_one(h) && j < i {
            return self.apply_ite(-g, -f, self.one);
        }
        if self.is_zero(g) && k < i {
            return self.apply_ite(-h, self.zero, -f);
        }
        if g == -h && j < i {
            return self.apply_ite(g, f, -f);
        }

        // Make sure the first two pointers (f and g) are regular (not negated)
        let (mut f, mut g, mut h) = (f, g, h);

        // ite(~F,G,H) => ite(F,H,G)
        if f.is_negated() {
            f = -f;
            std::mem::swap(&mut g, &mut h);
        }

        // ite(F,~G,H) => ~ite(F,G,~H)
        let mut n = false;
        if g.is_negated() {
            n = true;
            g = -g;
            h = -h;
        }

        let key = OpKey::Ite(f, g, h);
        if let Some(&res) = self.cache.borrow().get(&key) {
            debug!("cache: apply_ite(f = {}, g = {}, h = {}) -> {}", f, g, h, res);
            return Ok(if n { -res } else { res });
        }

        let m = self.top_variable(f, g, h);

        let (f0, f1) = self.top_cofactors(f, m);
        let (g0, g1) = self.top_cofactors(g, m);
        let (h0, h1) = self.top_cofactors(h, m);

        let e = self.apply_ite(f0, g0, h0)?;
        let t = self.apply_ite(f1, g1, h1)?;

        let res = self.mk_node(m, e, t)?;
        debug!("computed: apply_ite(f = {}, g = {}, h = {}) -> {}", f, g, h, res);
        self.cache.borrow_mut().insert(key, res);

        Ok(if n { -res } else { res })
    }

    fn top_variable(&self, f: Ref, g: Ref, h: Ref) -> u32 {
        let i = self.variable(f.index());
        let j = self.variable(g.index());
        let k = self.variable(h.index());
        assert_ne!(i, 0);
        let mut m = i;
        if j != 0 {
            m = m.min(j);
        }
        if k != 0 {
            m = m.min(k);
        }
        m
    }

    fn maybe_constant(&self, node: Ref) -> Option<bool> {
        if self.is_zero(node) {
            Some(false)
        } else if self.is_one(node) {
            Some(true)
        } else {
            None
        }
    }

    /// Decide whether `ite(f, g, h)` is a constant without building it.
    pub fn ite_constant(&self, f: Ref, g: Ref, h: Ref) -> Option<bool> {
        debug!("ite_constant(f = {}, g = {}, h = {})", f, g, h);
        let mut visited = HashMap::new();
        self.ite_constant_(f, g, h, &mut visited)
    }

    fn ite_constant_(
        &self,
        f: Ref,
        g: Ref,
        h: Ref,
        visited: &mut HashMap<(Ref, Ref, Ref), Option<bool>>,
    ) -> Option<bool> {

        if self.is_one(f) {
            return self.maybe_constant(g);
        }
        if self.is_zero(f) {
            return self.maybe_constant(h);
        }

        if g == h {
            return self.maybe_constant(g);
        }
        if self.is_one(g) && self.is_zero(h) {
            return None;
        }
        if self.is_zero(g) && self.is_one(h) {
            return None;
        }
        if self.is_one(g) && h == -f {
            return Some(true);
        }
        if g == f && self.is_one(h) {
            return Some(true);
        }
        if g == -f && self.is_zero(h) {
            return Some(false);
        }
        if self.is_zero(g) && h == f {
            return None;
        }

        // Only keys with regular `f` and `g` are ever cached by `apply_ite`,
        // and for those the cached result is exactly `ite(f, g, h)`.
        let key = OpKey::Ite(f, g, h);
        if let Some(&res) = self.cache.borrow().get(&key) {
            return self.maybe_constant(res);
        }

        if let Some(&res) = visited.get(&(f, g, h)) {
            return res;
        }

        let m = self.top_variable(f, g, h);

        let (f0, f1) = self.top_cofactors(f, m);
        let (g0, g1) = self.top_cofactors(g, m);
        let (h0, h1) = self.top_cofactors(h, m);

        let res = match self.ite_constant_(f1, g1, h1, visited) {
            Some(t) => match self.ite_constant_(f0, g0, h0, visited) {
                Some(e) if e == t => Some(t),
                _ => None,
            },
            None => None,
        };
        visited.insert((f, g, h), res);
        res
    }

    /// Check `f → g` (every minterm of `f` is a minterm of `g`).
    pub fn is_implies(&self, f: Ref, g: Ref) -> bool {
        debug!("is_implies(f = {}, g = {})", f, g);
        self.ite_constant(f, g, self.one) == Some(true)
    }

    pub fn apply_and(&self, u: Ref, v: Ref) -> BddResult<Ref> {
        self.apply_ite(u, v, self.zero)
    }

    pub fn apply_or(&self, u: Ref, v: Ref) -> BddResult<Ref> {
        self.apply_ite(u, self.one, v)
    }

    pub fn apply_xor(&self, u: Ref, v: Ref) -> BddResult<Ref> {
        self.apply_ite(u, -v, v)
    }

    pub fn apply_eq(&self, u: Ref, v: Ref) -> BddResult<Ref> {
        self.apply_ite(u, v, -v)
    }

    pub fn apply_and_many(&self, nodes: impl IntoIterator<Item = Ref>) -> BddResult<Ref> {
        let mut res = self.one;
        for node in nodes {
            res = self.apply_and(res, node)?;
        }
        Ok(res)
    }

    /// Cofactor: `f|v<-b`.
    pub fn cofactor(&self, f: Ref, v: u32, b: bool) -> BddResult<Ref> {
        let mut cache = HashMap::new();
        self.cofactor_(f, v, b, &mut cache)
    }

    fn cofactor_(
        &self,
        f: Ref,
        v: u32,
        b: bool,
        cache: &mut HashMap<Ref, Ref>,
    ) -> BddResult<Ref> {
        assert_ne!(v, 0, "Variable index should not be zero");

        if self.is_terminal(f) {
            return Ok(f);
        }

        let i = self.variable(f.index());

        if v < i {
            // 'f' does not depend on 'v'
            return Ok(f);
        }

        if v == i {
            return Ok(if b {
                self.high_node(f)
            } else {
                self.low_node(f)
            });
        }

        if let Some(&res) = cache.get(&f) {
            return Ok(res);
        }

        let low = self.cofactor_(self.low_node(f), v, b, cache)?;
        let high = self.cofactor_(self.high_node(f), v, b, cache)?;
        let res = self.mk_node(i, low, high)?;
        cache.insert(f, res);
        Ok(res)
    }

    /// Indices of all nodes reachable from `nodes`, the terminal included.
    pub fn descendants(&self, nodes: impl IntoIterator<Item = Ref>) -> HashSet<usize> {
        let mut visited = HashSet::new();
        visited.insert(self.one.index());
        let mut queue = VecDeque::from_iter(nodes);

        while let Some(node) = queue.pop_front() {
            let i = node.index();
            if visited.insert(i) {
                queue.push_back(self.low(i));
                queue.push_back(self.high(i));
            }
        }

        visited
    }

    /// Number of nodes in the BDD of `f`, the terminal included.
    pub fn size(&self, f: Ref) -> usize {
        self.descendants([f]).len()
    }

    /// Variables `f` depends on, in ascending order.
    pub fn support(&self, f: Ref) -> Vec<u32> {
        let mut vars: Vec<u32> = self
            .descendants([f])
            .into_iter()
            .map(|i| self.variable(i))
            .filter(|&v| v != 0)
            .collect();
        vars.sort_unstable();
        vars.dedup();
        vars
    }
}
