use approx::assert_relative_eq;

use enn_multiloss::{
    ActivationFunction, Adam, Batch, Dataset, EnsembleSpec, EpistemicNetwork, InMemoryLogger,
    L2Loss, LossFn, Matrix, MlpEnsemble, MultilossExperiment, MultilossTrainer, Params,
    RandomKey, SupervisedExperiment, WeightDecay, XentLoss,
};

fn ensemble(members: usize, hidden: Vec<usize>, outputs: usize) -> MlpEnsemble {
    MlpEnsemble::new(EnsembleSpec {
        name: "test".into(),
        num_members: members,
        hidden_sizes: hidden,
        output_size: outputs,
        activation: ActivationFunction::Tanh,
    })
    .unwrap()
}

fn nudged(params: &Params, name: &str, row: usize, col: usize, eps: f64) -> Params {
    let mut out = params.clone();
    let mut m = params.get(name).unwrap().clone();
    m.data[row][col] += eps;
    out.insert(name, m);
    out
}

/// Central differences of `loss_fn.evaluate` against `value_and_grad` on
/// every parameter entry.
fn check_gradient<L: LossFn<MlpEnsemble>>(loss_fn: &L, enn: &MlpEnsemble, batch: &Batch, key: RandomKey) {
    let params = enn.init(RandomKey::from_seed(11), &batch.x, &0).unwrap();
    let (out, grads) = loss_fn.value_and_grad(enn, &params, batch, key).unwrap();
    assert_relative_eq!(out.loss, loss_fn.evaluate(enn, &params, batch, key).unwrap().loss, epsilon = 1e-12);

    let eps = 1e-6;
    for (name, m) in params.iter() {
        for r in 0..m.rows {
            for c in 0..m.cols {
                let up = loss_fn.evaluate(enn, &nudged(&params, name, r, c, eps), batch, key).unwrap().loss;
                let down = loss_fn.evaluate(enn, &nudged(&params, name, r, c, -eps), batch, key).unwrap().loss;
                let numeric = (up - down) / (2.0 * eps);
                let analytic = grads.get(name).unwrap().data[r][c];
                assert!(
                    (numeric - analytic).abs() < 1e-5,
                    "{name}[{r}][{c}]: numeric {numeric} vs analytic {analytic}"
                );
            }
        }
    }
}

#[test]
fn l2_gradient_matches_finite_differences() {
    let enn = ensemble(3, vec![4], 2);
    let x = Matrix::from_rows(vec![vec![0.2, -0.7], vec![1.1, 0.4], vec![-0.5, -0.9]]).unwrap();
    let y = Matrix::from_rows(vec![vec![0.3, -0.1], vec![0.0, 1.0], vec![-0.8, 0.5]]).unwrap();
    let batch = Batch::new(x, y).with_weights(vec![1.0, 0.5, 2.0]);
    check_gradient(&L2Loss::new(3), &enn, &batch, RandomKey::from_seed(5));
}

#[test]
fn xent_gradient_matches_finite_differences() {
    let enn = ensemble(2, vec![5], 3);
    let x = Matrix::from_rows(vec![vec![0.2, -0.7], vec![1.1, 0.4], vec![-0.5, -0.9], vec![0.0, 0.3]]).unwrap();
    let y = Matrix::column(&[0.0, 2.0, 1.0, 2.0]).unwrap();
    check_gradient(&XentLoss::new(3, 2), &enn, &Batch::new(x, y), RandomKey::from_seed(8));
}

#[test]
fn weight_decay_gradient_matches_finite_differences() {
    let enn = ensemble(2, vec![3], 1);
    let batch = Batch::new(Matrix::filled(2, 2, 0.5), Matrix::zeros(2, 1));
    check_gradient(&WeightDecay::new(0.3), &enn, &batch, RandomKey::from_seed(0));
}

#[test]
fn ensemble_with_prior_fits_a_line() {
    let xs: Vec<f64> = (0..32).map(|i| -1.0 + 2.0 * i as f64 / 31.0).collect();
    let ys: Vec<f64> = xs.iter().map(|x| 0.5 * x + 0.3).collect();
    let batch = Batch::new(Matrix::column(&xs).unwrap(), Matrix::column(&ys).unwrap());

    let mut experiment = MultilossExperiment::builder(ensemble(2, vec![16], 1), Adam::default_params(1e-2))
        .seed(42)
        .trainer(MultilossTrainer::new(L2Loss::new(2), Dataset::repeat(batch.clone())))
        .trainer(
            MultilossTrainer::new(WeightDecay::new(1e-4), Dataset::repeat(batch.clone()))
                .with_name("prior")
                .with_schedule(|step| step % 5 == 0),
        )
        .eval_dataset("train_eval", Dataset::repeat(batch.clone()))
        .eval_log_freq(100)
        .logger(Box::new(InMemoryLogger::new()))
        .build()
        .unwrap();

    let before = experiment.loss(&batch, 0).unwrap();
    experiment.train(400).unwrap();
    let after = experiment.loss(&batch, 0).unwrap();

    assert_eq!(experiment.step(), 400);
    assert!(after < 0.5 * before, "loss went from {before} to {after}");
    assert!(after < 0.05, "final loss {after}");

    // Every member was trained, not just the one the first probe index hit.
    for seed in 0..8 {
        let pred = experiment.predict(&batch.x, seed).unwrap();
        let mse: f64 = pred.iter().zip(ys.iter()).map(|(p, y)| (p - y).powi(2)).sum::<f64>() / 32.0;
        assert!(mse < 0.1, "seed {seed}: mse {mse}");
    }
}

#[test]
fn ensemble_separates_two_classes() {
    let xs: Vec<f64> = (0..20).map(|i| if i < 10 { -1.5 + 0.1 * i as f64 } else { 0.5 + 0.1 * (i - 10) as f64 }).collect();
    let labels: Vec<f64> = (0..20).map(|i| if i < 10 { 0.0 } else { 1.0 }).collect();
    let batch = Batch::new(Matrix::column(&xs).unwrap(), Matrix::column(&labels).unwrap());

    let logger = InMemoryLogger::new();
    let mut experiment = MultilossExperiment::builder(ensemble(2, vec![8], 2), Adam::default_params(5e-2))
        .trainer(MultilossTrainer::new(XentLoss::new(2, 1), Dataset::repeat(batch.clone())))
        .train_log_freq(50)
        .logger(Box::new(logger.clone()))
        .build()
        .unwrap();

    experiment.train(300).unwrap();

    let acc = XentLoss::new(2, 2)
        .evaluate(experiment.enn(), experiment.params(), &batch, RandomKey::from_seed(1))
        .unwrap()
        .metrics["acc"];
    assert!(acc >= 0.9, "accuracy {acc}");

    let records = logger.records();
    assert_eq!(records.len(), 6);
    assert!(records.iter().all(|r| r.contains_key("acc") && r.contains_key("loss")));
}
