use rand::SeedableRng;
use snore::{
    dataset::Dataset,
    tinn::{activation::Activation, Network, Topology},
    train,
};

fn main() {
    let mut rng = rand::rngs::StdRng::from_entropy();
    let mut dataset = Dataset::new(2, 1);
    for (input, output) in [
        ([0.0, 0.0], 0.0),
        ([0.0, 1.0], 1.0),
        ([1.0, 0.0], 1.0),
        ([1.0, 1.0], 0.0),
    ] {
        dataset.push(input.to_vec(), vec![output]);
    }

    let topology = Topology::new(2, 4, 1).expect("valid topology");
    let mut network = Network::build(topology, Activation::Sigmoid, &mut rng);
    let mut rate = 1.0;
    for epoch in 0..20000 {
        train::sample_batch(&mut dataset, 4, &mut rng);
        let error: f32 = dataset
            .iter()
            .map(|(input, target)| network.train(input, target, rate))
            .sum();
        if epoch % 2000 == 0 {
            println!("epoch {:5}: error {:.6}, rate {:.4}", epoch, error / 4.0, rate);
        }
        rate *= 0.9999;
    }
    for (input, target) in dataset.iter() {
        let z = network.predict(input);
        println!("pred: {}", z[0]);
        println!("real: {}", target[0]);
        println!("================")
    }
}
