//! Provides ready to use [`NamedNodeRef`](super::NamedNodeRef)s for the vocabularies the
//! entailment rules and the evaluator work with.
//!
//! [`rdf`], [`rdfs`] and [`xsd`] come from [`oxrdf`].

pub use oxrdf::vocab::{rdf, rdfs, xsd};

pub mod owl {
    //! [OWL 2](https://www.w3.org/TR/owl2-overview/) vocabulary used by the OWL RL rules.
    use oxrdf::NamedNodeRef;

    pub const EQUIVALENT_CLASS: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#equivalentClass");
    pub const EQUIVALENT_PROPERTY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#equivalentProperty");
    pub const INVERSE_OF: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#inverseOf");
    pub const SAME_AS: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#sameAs");
    pub const SYMMETRIC_PROPERTY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#SymmetricProperty");
    pub const TRANSITIVE_PROPERTY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#TransitiveProperty");
}

pub mod dt {
    //! Extension datatypes of the engine.
    use oxrdf::NamedNodeRef;

    /// Composite value holding an ordered sequence of terms, produced by the `LIST` aggregate.
    pub const LIST: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://ns.inria.fr/sparql-datatype#list");
}
