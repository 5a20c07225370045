use super::schema::TypeNode;

/// Where an operation parameter travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterPlace {
    Path,
    Query,
    Body,
}

/// One parameter of an [`ApiMethod`]. Body parameters come from flattening
/// an object-typed JSON request body.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub place: ParameterPlace,
    pub name: String,
    pub ty: TypeNode,
    pub required: bool,
}

/// An HTTP operation from the entry document's `paths`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiMethod {
    /// Upper-case HTTP method (`GET`, `POST`, ...).
    pub http_method: String,
    pub route_path: String,
    pub parameters: Vec<Parameter>,
    /// A request body that is not an object, carried as a single type.
    pub body_type: Option<TypeNode>,
    /// The `200` JSON response type, or `void`.
    pub result_type: TypeNode,
}

impl ApiMethod {
    /// Parameters placed at `place`, in declaration order.
    pub fn parameters_in(&self, place: ParameterPlace) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter().filter(move |p| p.place == place)
    }
}
