//! Behavioral contract of the emitted method bodies.
//!
//! The impls below are verbatim what the templates render for a small
//! `News` entity; the assertions pin the semantics generated code must
//! keep: collectors preserve input order, unique collectors guarantee set
//! semantics only, and indexes resolve duplicate keys to the last record.

use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq)]
struct News {
    id: i64,
    title: String,
    tag_ids: Vec<i64>,
}

struct NewsList(Vec<News>);

impl NewsList {
    fn ids(&self) -> Vec<i64> {
        self.0.iter().map(|x| x.id.clone()).collect()
    }
}

impl NewsList {
    fn index(&self) -> HashMap<i64, News> {
        let mut r = HashMap::with_capacity(self.0.len());
        for x in &self.0 {
            r.insert(x.id.clone(), x.clone());
        }
        r
    }
}

impl NewsList {
    fn titles(&self) -> Vec<String> {
        self.0.iter().map(|x| x.title.clone()).collect()
    }
}

impl NewsList {
    fn unique_ids(&self) -> Vec<i64> {
        let idx: HashSet<i64> = self.0.iter().map(|x| x.id.clone()).collect();
        idx.into_iter().collect()
    }
}

impl NewsList {
    fn unique_tag_ids(&self) -> Vec<i64> {
        let idx: HashSet<i64> = self
            .0
            .iter()
            .flat_map(|x| x.tag_ids.iter().cloned())
            .collect();
        idx.into_iter().collect()
    }
}

fn news(id: i64, title: &str, tag_ids: &[i64]) -> News {
    News {
        id,
        title: title.into(),
        tag_ids: tag_ids.to_vec(),
    }
}

#[test]
fn collectors_preserve_input_order() {
    let ll = NewsList(vec![news(3, "c", &[]), news(1, "a", &[]), news(3, "b", &[])]);
    assert_eq!(ll.ids(), vec![3, 1, 3]);
    assert_eq!(ll.titles(), vec!["c", "a", "b"]);
}

#[test]
fn index_duplicate_keys_last_record_wins() {
    let ll = NewsList(vec![news(1, "a", &[]), news(1, "b", &[])]);
    let idx = ll.index();
    assert_eq!(idx.len(), 1);
    assert_eq!(idx[&1].title, "b");
}

#[test]
fn unique_scalar_is_complete_and_deduplicated() {
    let ll = NewsList(vec![
        news(3, "", &[]),
        news(1, "", &[]),
        news(3, "", &[]),
        news(2, "", &[]),
    ]);

    let got: HashSet<i64> = ll.unique_ids().into_iter().collect();
    assert_eq!(got, HashSet::from([1, 2, 3]));
    assert_eq!(ll.unique_ids().len(), 3);
}

#[test]
fn unique_vec_field_flattens_all_elements() {
    let ll = NewsList(vec![news(1, "", &[3, 1]), news(2, "", &[3, 2])]);

    let got: HashSet<i64> = ll.unique_tag_ids().into_iter().collect();
    assert_eq!(got, HashSet::from([1, 2, 3]));
}

#[test]
fn empty_list_yields_empty_results() {
    let ll = NewsList(vec![]);
    assert!(ll.ids().is_empty());
    assert!(ll.index().is_empty());
    assert!(ll.unique_tag_ids().is_empty());
}
