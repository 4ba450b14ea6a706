use rand::Rng;

use crate::error::Result;
use crate::math::matrix::Matrix;
use crate::network::enn::EpistemicNetwork;
use crate::network::spec::EnsembleSpec;
use crate::params::params::Params;
use crate::random::key::RandomKey;

/// Activations recorded by one forward pass of a single member.
#[derive(Debug, Clone)]
pub struct EnsembleTape {
    member: usize,
    /// Input to each layer (the previous layer's activation).
    inputs: Vec<Matrix>,
    /// Pre-activation values (z = aW + b) of each layer, needed for σ'(z).
    pre_activations: Vec<Matrix>,
}

/// An ensemble of MLPs, the simplest ENN: the index is the member id.
///
/// Parameters of member `k`, layer `i` live at `member_k/linear_i/{w,b}`,
/// with `w` shaped `fan_in × fan_out` and `b` shaped `1 × fan_out`.
#[derive(Debug, Clone)]
pub struct MlpEnsemble {
    spec: EnsembleSpec,
}

fn param_name(member: usize, layer: usize, leaf: &str) -> String {
    format!("member_{member}/linear_{layer}/{leaf}")
}

impl MlpEnsemble {
    pub fn new(spec: EnsembleSpec) -> Result<MlpEnsemble> {
        spec.validate()?;
        Ok(MlpEnsemble { spec })
    }

    pub fn spec(&self) -> &EnsembleSpec {
        &self.spec
    }

    pub fn num_members(&self) -> usize {
        self.spec.num_members
    }

    fn num_layers(&self) -> usize {
        self.spec.hidden_sizes.len() + 1
    }
}

impl EpistemicNetwork for MlpEnsemble {
    type Index = usize;
    type Tape = EnsembleTape;

    /// Initializes every member, each from its own sub-key; `index` does
    /// not restrict which members are created.
    fn init(&self, key: RandomKey, x: &Matrix, _index: &usize) -> Result<Params> {
        let mut widths = vec![x.cols];
        widths.extend_from_slice(&self.spec.hidden_sizes);
        widths.push(self.spec.output_size);

        let mut params = Params::new();
        for member in 0..self.spec.num_members {
            let mut rng = key.fold_in(member as u64).rng();
            for layer in 0..self.num_layers() {
                let (fan_in, fan_out) = (widths[layer], widths[layer + 1]);
                let is_output = layer + 1 == self.num_layers();
                let w = if !is_output && self.spec.activation.prefers_he_init() {
                    Matrix::he(fan_in, fan_out, &mut rng)
                } else {
                    Matrix::xavier(fan_in, fan_out, &mut rng)
                };
                params.insert(param_name(member, layer, "w"), w);
                params.insert(param_name(member, layer, "b"), Matrix::zeros(1, fan_out));
            }
        }
        Ok(params)
    }

    fn forward(&self, params: &Params, x: &Matrix, index: &usize) -> Result<(Matrix, EnsembleTape)> {
        let member = *index;
        let num_layers = self.num_layers();
        let mut inputs = Vec::with_capacity(num_layers);
        let mut pre_activations = Vec::with_capacity(num_layers);

        let mut a = x.clone();
        for layer in 0..num_layers {
            let w = params.require(&param_name(member, layer, "w"))?;
            let b = params.require(&param_name(member, layer, "b"))?;
            let z = a.matmul(w)?.add_row(b)?;
            // Output layer is linear.
            let next = if layer + 1 == num_layers {
                z.clone()
            } else {
                self.spec.activation.apply(&z)
            };
            inputs.push(a);
            pre_activations.push(z);
            a = next;
        }

        Ok((a, EnsembleTape { member, inputs, pre_activations }))
    }

    fn backward(&self, params: &Params, tape: &EnsembleTape, output_grad: &Matrix) -> Result<Params> {
        if let Some(last) = tape.pre_activations.last() {
            last.check_same_shape(output_grad, "ensemble.backward")?;
        }
        let num_layers = tape.inputs.len();
        let mut grads = params.zeros_like();

        // δ starts as ∂L/∂a of the output layer, which is ∂L/∂z since it is linear.
        let mut delta = output_grad.clone();
        for layer in (0..num_layers).rev() {
            if layer + 1 < num_layers {
                delta = delta.hadamard(&self.spec.activation.gradient(&tape.pre_activations[layer]))?;
            }

            let w_name = param_name(tape.member, layer, "w");
            let w = params.require(&w_name)?;
            grads.insert(w_name, tape.inputs[layer].transpose().matmul(&delta)?);
            grads.insert(param_name(tape.member, layer, "b"), delta.sum_rows());

            if layer > 0 {
                delta = delta.matmul(&w.transpose())?;
            }
        }
        Ok(grads)
    }

    fn indexer(&self, key: RandomKey) -> usize {
        key.rng().gen_range(0..self.spec.num_members)
    }
}
