use std::cmp::Ordering;

use crate::entities::order::{Order, OrderError, OrderId};

type Link = Option<Box<Node>>;

#[derive(Debug)]
struct Node {
    order: Order,
    left: Link,
    right: Link,
}

impl Node {
    fn new(order: Order) -> Self {
        Self {
            order,
            left: None,
            right: None,
        }
    }
}

/// Binary search tree of orders keyed by order id. Every link points
/// strictly downward and ids are unique, so for each node the left subtree
/// holds smaller ids and the right subtree larger ones. The tree is never
/// rebalanced: operations cost O(height), linear in the worst case.
#[derive(Debug, Default)]
pub struct OrderTreeStore {
    root: Link,
}

impl OrderTreeStore {
    pub fn new() -> Self {
        Default::default()
    }

    /// Places the order at the empty slot its id leads to. An id that is
    /// already stored is rejected and the stored order stays untouched.
    pub fn insert(&mut self, order: Order) -> Result<(), OrderError> {
        let order_id = order.order_id();
        insert_link(&mut self.root, order)?;

        log::debug!("inserted an order with an id {}", order_id);
        Ok(())
    }

    pub fn exists(&self, order_id: OrderId) -> bool {
        self.get(order_id).is_some()
    }

    pub fn get(&self, order_id: OrderId) -> Option<&Order> {
        let mut link = self.root.as_deref();
        while let Some(node) = link {
            link = match order_id.cmp(&node.order.order_id()) {
                Ordering::Less => node.left.as_deref(),
                Ordering::Greater => node.right.as_deref(),
                Ordering::Equal => return Some(&node.order),
            };
        }

        None
    }

    /// Replaces the stored order without touching the tree shape. The new
    /// order has to carry the id it replaces: identity never changes on
    /// update, only the payload does.
    pub fn update(&mut self, order_id: OrderId, new_order: Order) -> Result<(), OrderError> {
        if new_order.order_id() != order_id {
            return Err(OrderError::InvalidArgument(format!(
                "can't update the order with an id {} using an order with an id {}",
                order_id,
                new_order.order_id()
            )));
        }

        match find_order_mut(&mut self.root, order_id) {
            Some(order) => {
                *order = new_order;
                log::debug!("updated an order with an id {}", order_id);
                Ok(())
            }
            None => Err(OrderError::NotFound(order_id)),
        }
    }

    /// Removes the order with the given id and returns it. A node with two
    /// children takes over the order of its in-order successor, the smallest
    /// id in its right subtree; a node with at most one child is replaced by
    /// that child.
    pub fn delete(&mut self, order_id: OrderId) -> Result<Order, OrderError> {
        let (root, removed) = remove_link(self.root.take(), order_id);
        self.root = root;

        match removed {
            Some(order) => {
                log::debug!("deleted an order with an id {}", order_id);
                Ok(order)
            }
            None => Err(OrderError::NotFound(order_id)),
        }
    }

    /// Recounted by full traversal on every call.
    pub fn count(&self) -> usize {
        count_nodes(&self.root)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Lazy in-order walk yielding orders in ascending id order. Every call
    /// starts a fresh traversal.
    pub fn orders_by_id(&self) -> OrdersById<'_> {
        OrdersById::new(&self.root)
    }

    /// Snapshot of all orders stably sorted by total. The in-order traversal
    /// feeds the sort, so orders with equal totals stay in ascending id
    /// order whichever direction is requested. Mutating the tree afterwards
    /// doesn't affect the returned list.
    pub fn sorted_by_total(&self, ascending: bool) -> Vec<Order> {
        let mut orders: Vec<Order> = self.orders_by_id().cloned().collect();

        if ascending {
            orders.sort_by(|a, b| a.total().cmp(&b.total()));
        } else {
            orders.sort_by(|a, b| b.total().cmp(&a.total()));
        }

        orders
    }
}

/// Lazy in-order iterator over the tree. The stack holds the path of nodes
/// whose own order is still pending, smallest id on top.
#[derive(Debug)]
pub struct OrdersById<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> OrdersById<'a> {
    fn new(root: &'a Link) -> Self {
        let mut iter = Self { stack: Vec::new() };
        iter.push_left_spine(root.as_deref());
        iter
    }

    fn push_left_spine(&mut self, mut link: Option<&'a Node>) {
        while let Some(node) = link {
            self.stack.push(node);
            link = node.left.as_deref();
        }
    }
}

impl<'a> Iterator for OrdersById<'a> {
    type Item = &'a Order;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_left_spine(node.right.as_deref());
        Some(&node.order)
    }
}

fn insert_link(link: &mut Link, order: Order) -> Result<(), OrderError> {
    match link {
        None => {
            *link = Some(Box::new(Node::new(order)));
            Ok(())
        }
        Some(node) => match order.order_id().cmp(&node.order.order_id()) {
            Ordering::Less => insert_link(&mut node.left, order),
            Ordering::Greater => insert_link(&mut node.right, order),
            Ordering::Equal => Err(OrderError::DuplicateKey(order.order_id())),
        },
    }
}

fn find_order_mut(link: &mut Link, order_id: OrderId) -> Option<&mut Order> {
    let node = link.as_deref_mut()?;
    match order_id.cmp(&node.order.order_id()) {
        Ordering::Less => find_order_mut(&mut node.left, order_id),
        Ordering::Greater => find_order_mut(&mut node.right, order_id),
        Ordering::Equal => Some(&mut node.order),
    }
}

fn count_nodes(link: &Link) -> usize {
    match link {
        None => 0,
        Some(node) => 1 + count_nodes(&node.left) + count_nodes(&node.right),
    }
}

/// Rebuilds the subtree without the order carrying `order_id` and hands the
/// removed order back, or `None` when the id isn't there.
fn remove_link(link: Link, order_id: OrderId) -> (Link, Option<Order>) {
    let mut node = match link {
        None => return (None, None),
        Some(node) => node,
    };

    match order_id.cmp(&node.order.order_id()) {
        Ordering::Less => {
            let (left, removed) = remove_link(node.left.take(), order_id);
            node.left = left;
            (Some(node), removed)
        }
        Ordering::Greater => {
            let (right, removed) = remove_link(node.right.take(), order_id);
            node.right = right;
            (Some(node), removed)
        }
        Ordering::Equal => {
            let Node { order, left, right } = *node;
            match (left, right) {
                // At most one child: the child moves up into this slot.
                (None, child) | (child, None) => (child, Some(order)),
                (Some(left), Some(right)) => {
                    let (right, successor) = detach_min(right);
                    let promoted = Node {
                        order: successor,
                        left: Some(left),
                        right,
                    };

                    (Some(Box::new(promoted)), Some(order))
                }
            }
        }
    }
}

/// Detaches the smallest-id node of the subtree. The minimum has no left
/// child, so its right child takes its slot.
fn detach_min(mut node: Box<Node>) -> (Link, Order) {
    match node.left.take() {
        Some(left) => {
            let (left, min) = detach_min(left);
            node.left = left;
            (Some(node), min)
        }
        None => {
            let Node { order, right, .. } = *node;
            (right, order)
        }
    }
}
