//! Translators and combiners: stateless value transforms that derive
//! channels without a bespoke site type per operator.

use std::sync::Arc;

use rill_value::Value;

use crate::{Channel, MemoKey, ReflectorRef, Site};

/// A stateless bidirectional transform. `translate` is the get
/// direction; `revert` is the set direction and returns `None` when the
/// transform is not invertible (making the derived channel read-only).
pub trait Translator: Send + Sync {
    fn translate(&self, input: Option<Value>) -> Option<Value>;

    fn revert(&self, output: Option<Value>) -> Option<Option<Value>> {
        let _ = output;
        None
    }
}

/// Site pairing one source channel with a translator.
pub struct TranslatedSite {
    source: Channel,
    translator: Arc<dyn Translator>,
}

impl TranslatedSite {
    pub fn new(source: Channel, translator: Arc<dyn Translator>) -> Self {
        TranslatedSite { source, translator }
    }
}

impl Site for TranslatedSite {
    fn get(&self) -> Option<Value> {
        self.translator.translate(self.source.get())
    }

    fn set(&self, value: Option<Value>) -> bool {
        match self.translator.revert(value) {
            Some(back) => self.source.store(back),
            None => false,
        }
    }
}

/// A stateless two-source transform: the get direction of every binary
/// operator channel.
pub trait Combiner: Send + Sync {
    fn combine(&self, left: Option<Value>, right: Option<Value>) -> Option<Value>;
}

/// Site pairing two source channels with a combiner.
pub struct CombinedSite {
    left: Channel,
    right: Channel,
    combiner: Arc<dyn Combiner>,
}

impl CombinedSite {
    pub fn new(left: Channel, right: Channel, combiner: Arc<dyn Combiner>) -> Self {
        CombinedSite {
            left,
            right,
            combiner,
        }
    }
}

impl Site for CombinedSite {
    fn get(&self) -> Option<Value> {
        self.combiner
            .combine(self.left.get(), self.right.get())
    }
}

impl Channel {
    /// Derive a translated channel, memoized by translator identity so
    /// rebinding with the same translator instance yields the same
    /// channel object.
    pub fn translated(
        &self,
        reflector: ReflectorRef,
        translator: Arc<dyn Translator>,
    ) -> Channel {
        let key = MemoKey::Translator(translator_id(&translator));
        self.derived(key, || {
            Channel::new(
                reflector,
                Box::new(TranslatedSite::new(self.clone(), translator)),
            )
        })
    }
}

/// Stable identity of a translator instance.
fn translator_id(translator: &Arc<dyn Translator>) -> usize {
    Arc::as_ptr(translator).cast::<()>() as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TypeRegistry;
    use pretty_assertions::assert_eq;
    use rill_value::ContentKind;

    struct Doubler;

    impl Translator for Doubler {
        fn translate(&self, input: Option<Value>) -> Option<Value> {
            match input? {
                Value::Int(n) => Some(Value::Int(n * 2)),
                _ => None,
            }
        }

        fn revert(&self, output: Option<Value>) -> Option<Option<Value>> {
            match output? {
                Value::Int(n) => Some(Some(Value::Int(n / 2))),
                _ => None,
            }
        }
    }

    #[test]
    fn translated_channels_are_bidirectional() {
        let registry = Arc::new(TypeRegistry::new());
        let int = registry.builtin(ContentKind::Int);
        let source = Channel::cell(int.clone(), Some(Value::Int(4)));
        let translator: Arc<dyn Translator> = Arc::new(Doubler);
        let doubled = source.translated(int, translator);

        assert_eq!(doubled.get(), Some(Value::Int(8)));
        assert!(doubled.store(Some(Value::Int(10))));
        assert_eq!(source.get(), Some(Value::Int(5)));
    }

    #[test]
    fn same_translator_instance_memoizes() {
        let registry = Arc::new(TypeRegistry::new());
        let int = registry.builtin(ContentKind::Int);
        let source = Channel::cell(int.clone(), None);
        let translator: Arc<dyn Translator> = Arc::new(Doubler);
        let a = source.translated(int.clone(), Arc::clone(&translator));
        let b = source.translated(int, translator);
        assert!(a.ptr_eq(&b));
    }
}
