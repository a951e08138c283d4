//! Instruction recorder
//!
//! A [`Recorder`] speaks the presenter's operation vocabulary but records
//! instead of mutating. The mutation handler already knows exactly which
//! operations it performs, so the resulting transformation is exact by
//! construction rather than diffed.

use weft_presenter::DataObject;

use crate::instruction::{Call, Op, Transformation};

/// Records view operations as a serializable instruction tree
#[derive(Debug, Default)]
pub struct Recorder {
    calls: Vec<Call>,
}

impl Recorder {
    /// Create an empty recorder
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record binding one object
    pub fn bind(&mut self, object: DataObject) -> &mut Self {
        self.calls.push(Call::leaf(Op::Bind(object)));
        self
    }

    /// Record presenting a collection
    pub fn present(&mut self, objects: Vec<DataObject>) -> &mut Self {
        self.calls.push(Call::leaf(Op::Present(objects)));
        self
    }

    /// Record presenting with per-instance logic
    ///
    /// The closure runs once per object against a sub-recorder; each run
    /// becomes one nested instruction group, in the order the data was
    /// supplied. Replay pairs groups with instances by position, so the
    /// order must be preserved exactly.
    pub fn present_with(
        &mut self,
        objects: Vec<DataObject>,
        mut record: impl FnMut(&mut Recorder, &DataObject),
    ) -> &mut Self {
        let mut nested = Vec::with_capacity(objects.len());
        for object in &objects {
            let mut sub = Recorder::new();
            record(&mut sub, object);
            nested.push(sub.calls);
        }
        self.calls.push(Call {
            op: Op::Present(objects),
            nested,
        });
        self
    }

    /// Record a version switch
    pub fn use_version(&mut self, version: impl Into<String>) -> &mut Self {
        self.calls.push(Call::leaf(Op::Use(version.into())));
        self
    }

    /// Record appending markup
    pub fn append(&mut self, markup: impl Into<String>) -> &mut Self {
        self.calls.push(Call::leaf(Op::Append(markup.into())));
        self
    }

    /// Record prepending markup
    pub fn prepend(&mut self, markup: impl Into<String>) -> &mut Self {
        self.calls.push(Call::leaf(Op::Prepend(markup.into())));
        self
    }

    /// Record removing the current view
    pub fn remove(&mut self) -> &mut Self {
        self.calls.push(Call::leaf(Op::Remove));
        self
    }

    /// Record setting one attribute part
    pub fn attr(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.calls.push(Call::leaf(Op::Attr {
            name: name.into(),
            value: value.into(),
        }));
        self
    }

    /// Record operations against a nested scope
    ///
    /// The closure receives a sub-recorder scoped to the named region; its
    /// recording becomes the call's single nested group.
    pub fn scope(&mut self, name: impl Into<String>, record: impl FnOnce(&mut Recorder)) -> &mut Self {
        let mut sub = Recorder::new();
        record(&mut sub);
        self.calls.push(Call {
            op: Op::Scope(name.into()),
            nested: vec![sub.calls],
        });
        self
    }

    /// Record operations against a prop
    pub fn prop(&mut self, name: impl Into<String>, record: impl FnOnce(&mut Recorder)) -> &mut Self {
        let mut sub = Recorder::new();
        record(&mut sub);
        self.calls.push(Call {
            op: Op::Prop(name.into()),
            nested: vec![sub.calls],
        });
        self
    }

    /// Record iterating over objects without re-presenting the site
    pub fn repeat(
        &mut self,
        objects: Vec<DataObject>,
        mut record: impl FnMut(&mut Recorder, &DataObject),
    ) -> &mut Self {
        let mut nested = Vec::with_capacity(objects.len());
        for object in &objects {
            let mut sub = Recorder::new();
            record(&mut sub, object);
            nested.push(sub.calls);
        }
        self.calls.push(Call {
            op: Op::Repeat(objects),
            nested,
        });
        self
    }

    /// Number of recorded top-level calls
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// Whether nothing has been recorded
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Freeze the recording into a transformation for one rendered region
    #[must_use]
    pub fn finalize(self, id: impl Into<String>) -> Transformation {
        Transformation {
            id: id.into(),
            calls: self.calls,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(id: i64) -> DataObject {
        DataObject::new().with_scalar("id", id)
    }

    #[test]
    fn recorder_captures_calls_in_order() {
        let mut recorder = Recorder::new();
        recorder.use_version("wide").attr("class", "live").remove();
        let transformation = recorder.finalize("t1");

        let names: Vec<&str> = transformation.calls.iter().map(|c| c.op.name()).collect();
        assert_eq!(names, vec!["use", "attr", "remove"]);
    }

    #[test]
    fn present_with_records_one_group_per_object() {
        let mut recorder = Recorder::new();
        recorder.present_with(vec![object(1), object(2)], |sub, obj| {
            if obj.id().as_deref() == Some("2") {
                sub.use_version("featured");
            }
        });
        let transformation = recorder.finalize("t1");

        let call = &transformation.calls[0];
        assert_eq!(call.nested.len(), 2);
        assert!(call.nested[0].is_empty());
        assert_eq!(call.nested[1][0].op.name(), "use");
    }

    #[test]
    fn scope_records_single_nested_group() {
        let mut recorder = Recorder::new();
        recorder.scope("comment", |sub| {
            sub.present(vec![object(7)]);
        });
        let transformation = recorder.finalize("t1");

        let call = &transformation.calls[0];
        assert_eq!(call.op.name(), "scope");
        assert_eq!(call.nested.len(), 1);
        assert_eq!(call.nested[0][0].op.name(), "present");
    }

    #[test]
    fn finalize_carries_region_id() {
        let transformation = Recorder::new().finalize("region-9");
        assert_eq!(transformation.id, "region-9");
        assert!(transformation.calls.is_empty());
    }
}
