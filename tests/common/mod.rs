//! Shared fixtures and structural checks for the integration tests.
#![allow(dead_code)]

use std::fmt::Debug;

use markedtree::{Mark, MarkedTree, NodeRef};

/// Marks of the music tree, by item.
#[derive(Debug, Clone, Copy)]
pub struct MusicMarks {
    pub music: Mark,
    pub jazz: Mark,
    pub blues: Mark,
    pub thrill: Mark,
    pub mannish: Mark,
    pub rap: Mark,
    pub video: Mark,
    pub comedy: Mark,
    pub action: Mark,
}

/// Builds, in chained mode:
///
/// ```text
/// ROOT
/// ├── music
/// │   ├── jazz
/// │   ├── blues
/// │   │   ├── The Thrill is Gone
/// │   │   └── Mannish Boy
/// │   └── rap
/// └── video
///     ├── comedy
///     └── action
/// ```
///
/// The cursor is left at root level with `video` as last.
pub fn music_tree() -> (MarkedTree<String>, MusicMarks) {
    let mut tree = MarkedTree::new("ROOT".to_string());
    let music = tree.add("music".to_string()).unwrap();
    tree.descend().unwrap();
    let jazz = tree.add("jazz".to_string()).unwrap();
    let blues = tree.add("blues".to_string()).unwrap();
    tree.descend().unwrap();
    let thrill = tree.add("The Thrill is Gone".to_string()).unwrap();
    let mannish = tree.add("Mannish Boy".to_string()).unwrap();
    tree.ascend().unwrap();
    let rap = tree.add("rap".to_string()).unwrap();
    tree.ascend().unwrap();
    let video = tree.add("video".to_string()).unwrap();
    tree.descend().unwrap();
    let comedy = tree.add("comedy".to_string()).unwrap();
    let action = tree.add("action".to_string()).unwrap();
    tree.ascend().unwrap();
    let marks = MusicMarks {
        music,
        jazz,
        blues,
        thrill,
        mannish,
        rap,
        video,
        comedy,
        action,
    };
    (tree, marks)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Food {
    pub name: String,
    pub selected: bool,
}

impl Food {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            selected: false,
        }
    }
}

/// Marks of the food tree, by item.
#[derive(Debug, Clone, Copy)]
pub struct FoodMarks {
    pub fruit: Mark,
    pub orange: Mark,
    pub vegetable: Mark,
    pub asparagus: Mark,
}

/// `food` with `fruit` (apple, bananna, apricot, orange) and `vegetable`
/// (tomato, asparagus).
pub fn food_tree() -> (MarkedTree<Food>, FoodMarks) {
    let mut tree = MarkedTree::new(Food::new("food"));
    let fruit = tree.add(Food::new("fruit")).unwrap();
    tree.descend().unwrap();
    tree.add(Food::new("apple")).unwrap();
    tree.add(Food::new("bananna")).unwrap();
    tree.add(Food::new("apricot")).unwrap();
    let orange = tree.add(Food::new("orange")).unwrap();
    tree.ascend().unwrap();
    let vegetable = tree.add(Food::new("vegetable")).unwrap();
    tree.descend().unwrap();
    tree.add(Food::new("tomato")).unwrap();
    let asparagus = tree.add(Food::new("asparagus")).unwrap();
    let marks = FoodMarks {
        fruit,
        orange,
        vegetable,
        asparagus,
    };
    (tree, marks)
}

/// Names of the selected food items, in pre-order.
pub fn selected(tree: &MarkedTree<Food>) -> Vec<String> {
    tree.iter()
        .filter(|node| node.item().selected)
        .map(|node| node.item().name.clone())
        .collect()
}

pub fn names<'a>(nodes: &[NodeRef<'a, String>]) -> Vec<&'a str> {
    nodes.iter().map(|node| node.item().as_str()).collect()
}

pub fn child_names(tree: &MarkedTree<String>, mark: Mark) -> Vec<&str> {
    tree.get_child_items(mark)
        .into_iter()
        .map(String::as_str)
        .collect()
}

pub fn top_names(tree: &MarkedTree<String>) -> Vec<&str> {
    tree.root()
        .child_items()
        .into_iter()
        .map(String::as_str)
        .collect()
}

/// Pre-order `(mark, item, parent mark)` triples; equal shapes give equal lists.
pub fn shape<T: Clone>(tree: &MarkedTree<T>) -> Vec<(Mark, T, Option<Mark>)> {
    tree.iter()
        .map(|node| {
            (
                node.mark(),
                node.item().clone(),
                node.parent().map(|parent| parent.mark()),
            )
        })
        .collect()
}

/// Checks sibling and first-child links of every reachable node, and that
/// reachability agrees with `size`.
pub fn assert_links<T: Debug>(tree: &MarkedTree<T>) {
    let mut reachable = 0;
    for node in tree.iter() {
        reachable += 1;
        if let Some(next) = node.next() {
            assert_eq!(next.prev(), Some(node), "next.prev must point back");
            assert!(!next.is_first_child());
        }
        if let Some(child) = node.child() {
            assert_eq!(child.prev(), Some(node), "first child prev is the parent");
            assert_eq!(child.parent(), Some(node));
            assert!(child.is_first_child());
        }
    }
    assert_eq!(reachable, tree.size());
    assert_eq!(tree.marks().len() + 1, tree.size());
}
